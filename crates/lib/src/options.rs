//! # Options/Profile Resolver
//!
//! Resolves the cascading dropdown choices of the registration form
//! (region → channel → partner-type → network → store, plus role by channel)
//! from two static lookup tables embedded at compile time. All lookups are
//! pure and deterministic; unknown filter keys yield an empty list.

use crate::errors::QuizError;
use serde::Deserialize;
use std::collections::HashMap;

const COMMERCIAL_STRUCTURE_JSON: &str = include_str!("../data/estrutura_comercial.json");
const ROLES_JSON: &str = include_str!("../data/cargos.json");

/// One row of the commercial structure table: a store and its full lineage.
#[derive(Debug, Clone, Deserialize)]
struct CommercialRow {
    ddd: String,
    canal: String,
    tipo_parceiro: String,
    rede: String,
    loja: String,
}

/// The parsed lookup tables, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct OptionsCatalog {
    rows: Vec<CommercialRow>,
    roles_by_channel: HashMap<String, Vec<String>>,
}

fn sorted_dedup(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values.dedup();
    values
}

impl OptionsCatalog {
    /// Parses the embedded lookup tables. Fails only on malformed data files.
    pub fn load() -> Result<Self, QuizError> {
        let rows: Vec<CommercialRow> = serde_json::from_str(COMMERCIAL_STRUCTURE_JSON)?;
        let roles_by_channel: HashMap<String, Vec<String>> = serde_json::from_str(ROLES_JSON)?;
        Ok(Self {
            rows,
            roles_by_channel,
        })
    }

    /// All region codes (DDDs) present in the structure table.
    pub fn regions(&self) -> Vec<String> {
        sorted_dedup(self.rows.iter().map(|r| r.ddd.clone()).collect())
    }

    /// Channels available in a region.
    pub fn channels(&self, ddd: &str) -> Vec<String> {
        sorted_dedup(
            self.rows
                .iter()
                .filter(|r| r.ddd == ddd)
                .map(|r| r.canal.clone())
                .collect(),
        )
    }

    /// Partner types for a region/channel pair.
    pub fn partner_types(&self, ddd: &str, canal: &str) -> Vec<String> {
        sorted_dedup(
            self.rows
                .iter()
                .filter(|r| r.ddd == ddd && r.canal == canal)
                .map(|r| r.tipo_parceiro.clone())
                .collect(),
        )
    }

    /// Partner networks below a region/channel/partner-type.
    pub fn networks(&self, ddd: &str, canal: &str, tipo: &str) -> Vec<String> {
        sorted_dedup(
            self.rows
                .iter()
                .filter(|r| r.ddd == ddd && r.canal == canal && r.tipo_parceiro == tipo)
                .map(|r| r.rede.clone())
                .collect(),
        )
    }

    /// Stores below a region/channel/partner-type/network.
    pub fn stores(&self, ddd: &str, canal: &str, tipo: &str, rede: &str) -> Vec<String> {
        sorted_dedup(
            self.rows
                .iter()
                .filter(|r| {
                    r.ddd == ddd && r.canal == canal && r.tipo_parceiro == tipo && r.rede == rede
                })
                .map(|r| r.loja.clone())
                .collect(),
        )
    }

    /// Roles available for a channel.
    pub fn roles(&self, canal: &str) -> Vec<String> {
        self.roles_by_channel
            .get(canal)
            .map(|roles| sorted_dedup(roles.clone()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads_and_cascades() {
        let catalog = OptionsCatalog::load().unwrap();

        let regions = catalog.regions();
        assert!(!regions.is_empty());
        assert!(regions.windows(2).all(|w| w[0] < w[1]), "sorted, deduped");

        let ddd = &regions[0];
        let channels = catalog.channels(ddd);
        assert!(!channels.is_empty());

        let canal = &channels[0];
        let tipos = catalog.partner_types(ddd, canal);
        assert!(!tipos.is_empty());

        let redes = catalog.networks(ddd, canal, &tipos[0]);
        assert!(!redes.is_empty());
        assert!(!catalog.stores(ddd, canal, &tipos[0], &redes[0]).is_empty());
    }

    #[test]
    fn test_unknown_keys_yield_empty_lists() {
        let catalog = OptionsCatalog::load().unwrap();
        assert!(catalog.channels("00").is_empty());
        assert!(catalog.partner_types("11", "Canal Inexistente").is_empty());
        assert!(catalog.roles("Canal Inexistente").is_empty());
    }
}
