use super::{handlers, state::AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Public: registration and profile.
        .route("/user", post(handlers::upsert_user_handler))
        .route("/user/{telegram_id}", get(handlers::get_user_handler))
        // Public: cascading registration-form options.
        .route("/options/regioes", get(handlers::regioes_handler))
        .route("/options/canais", get(handlers::canais_handler))
        .route("/options/tipos", get(handlers::tipos_handler))
        .route("/options/redes", get(handlers::redes_handler))
        .route("/options/lojas", get(handlers::lojas_handler))
        .route("/options/cargos", get(handlers::cargos_handler))
        // Public: quiz lifecycle and ranking.
        .route("/quiz/start", get(handlers::start_quiz_handler))
        .route("/quiz/answer", post(handlers::answer_handler))
        .route("/quiz/finish", post(handlers::finish_quiz_handler))
        .route("/top10", get(handlers::top10_handler))
        // Admin: authentication and user management.
        .route("/admin/login", post(handlers::login_handler))
        .route("/admin/admins", post(handlers::add_admin_handler))
        .route(
            "/admin/users/{telegram_id}",
            delete(handlers::delete_user_handler),
        )
        // Admin: question bank.
        .route(
            "/admin/questions",
            get(handlers::list_questions_handler)
                .post(handlers::create_question_handler)
                .delete(handlers::delete_all_questions_handler),
        )
        .route(
            "/admin/questions/{id}",
            put(handlers::update_question_handler).delete(handlers::delete_question_handler),
        )
        .route(
            "/admin/questions/import",
            post(handlers::import_questions_handler),
        )
        // Admin: challenge campaigns.
        .route("/admin/challenges", get(handlers::list_challenges_handler))
        .route(
            "/admin/challenge/activate",
            post(handlers::activate_challenge_handler),
        )
        .route(
            "/admin/challenge/deactivate",
            post(handlers::deactivate_challenge_handler),
        )
        // Admin: knowledge pills.
        .route(
            "/admin/pills",
            get(handlers::list_pills_handler).post(handlers::create_pill_handler),
        )
        .route(
            "/admin/pills/{id}",
            put(handlers::update_pill_handler).delete(handlers::delete_pill_handler),
        )
        .route("/admin/pills/import", post(handlers::import_pills_handler))
        .route(
            "/admin/pills/send-now",
            post(handlers::send_pill_now_handler),
        )
        // Admin: runtime configuration.
        .route(
            "/admin/config",
            get(handlers::get_config_handler).put(handlers::update_config_handler),
        )
        // BI export (shared secret).
        .route("/bi/users", get(handlers::bi_users_handler))
        .route("/bi/results", get(handlers::bi_results_handler))
        .route("/bi/answers", get(handlers::bi_answers_handler))
        .route(
            "/bi/stats/{telegram_id}",
            get(handlers::bi_user_stats_handler),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
