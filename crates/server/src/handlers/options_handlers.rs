//! Handlers for the cascading registration-form dropdowns. Each endpoint
//! narrows the options catalog by the query parameters collected so far;
//! unknown keys yield an empty list, never an error.

use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

/// The cascade filters accumulated by the registration form.
#[derive(Debug, Default, Deserialize)]
pub struct OptionsParams {
    #[serde(default)]
    pub ddd: String,
    #[serde(default)]
    pub canal: String,
    #[serde(default)]
    pub tipo: String,
    #[serde(default)]
    pub rede: String,
}

/// Handler for `GET /options/regioes`.
pub async fn regioes_handler(State(app_state): State<AppState>) -> Json<Vec<String>> {
    Json(app_state.options.regions())
}

/// Handler for `GET /options/canais?ddd=..`.
pub async fn canais_handler(
    State(app_state): State<AppState>,
    Query(params): Query<OptionsParams>,
) -> Json<Vec<String>> {
    Json(app_state.options.channels(&params.ddd))
}

/// Handler for `GET /options/tipos?ddd=..&canal=..`.
pub async fn tipos_handler(
    State(app_state): State<AppState>,
    Query(params): Query<OptionsParams>,
) -> Json<Vec<String>> {
    Json(app_state.options.partner_types(&params.ddd, &params.canal))
}

/// Handler for `GET /options/redes?ddd=..&canal=..&tipo=..`.
pub async fn redes_handler(
    State(app_state): State<AppState>,
    Query(params): Query<OptionsParams>,
) -> Json<Vec<String>> {
    Json(
        app_state
            .options
            .networks(&params.ddd, &params.canal, &params.tipo),
    )
}

/// Handler for `GET /options/lojas?ddd=..&canal=..&tipo=..&rede=..`.
pub async fn lojas_handler(
    State(app_state): State<AppState>,
    Query(params): Query<OptionsParams>,
) -> Json<Vec<String>> {
    Json(
        app_state
            .options
            .stores(&params.ddd, &params.canal, &params.tipo, &params.rede),
    )
}

/// Handler for `GET /options/cargos?canal=..`.
pub async fn cargos_handler(
    State(app_state): State<AppState>,
    Query(params): Query<OptionsParams>,
) -> Json<Vec<String>> {
    Json(app_state.options.roles(&params.canal))
}
