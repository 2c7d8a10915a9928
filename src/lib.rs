pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::ports::{LedgerRepository, UserDirectory};
use crate::services::{
    LedgerService, ReferralEngine, RewardCreditingService, SettingsProvider, WithdrawalWorkflow,
};

#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerService,
    pub referrals: Arc<ReferralEngine>,
    pub rewards: Arc<RewardCreditingService>,
    pub withdrawals: Arc<WithdrawalWorkflow>,
    pub settings: Arc<SettingsProvider>,
    pub admin_api_key: Arc<str>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn LedgerRepository>,
        users: Arc<dyn UserDirectory>,
        settings: Arc<SettingsProvider>,
        admin_api_key: &str,
    ) -> Self {
        Self {
            ledger: LedgerService::new(repository.clone()),
            referrals: Arc::new(ReferralEngine::new(
                repository.clone(),
                users,
                settings.clone(),
            )),
            rewards: Arc::new(RewardCreditingService::new(
                repository.clone(),
                settings.clone(),
            )),
            withdrawals: Arc::new(WithdrawalWorkflow::new(repository, settings.clone())),
            settings,
            admin_api_key: Arc::from(admin_api_key),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    use crate::handlers::{admin, referrals, wallet, withdrawals};

    let admin_routes = Router::new()
        .route("/referrals/:id/credit", post(referrals::credit_referral))
        .route("/withdrawals", get(withdrawals::list_withdrawals))
        .route("/withdrawals/:id/approve", post(withdrawals::approve_withdrawal))
        .route("/withdrawals/:id/process", post(withdrawals::process_withdrawal))
        .route("/withdrawals/:id/reject", post(withdrawals::reject_withdrawal))
        .route("/wallets/:user_id/bonus", post(admin::grant_bonus))
        .route("/wallets/:user_id/audit", get(admin::audit_wallet))
        .route("/stats", get(admin::stats))
        .route(
            "/settings",
            get(admin::get_settings).put(admin::update_settings),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::admin_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/wallets/:user_id", get(wallet::get_wallet))
        .route("/wallets/:user_id/transactions", get(wallet::list_transactions))
        .route(
            "/wallets/:user_id/transactions/export",
            get(wallet::export_transactions),
        )
        .route("/users/:user_id/referrals", get(referrals::list_user_referrals))
        .route("/users/:user_id/withdrawals", get(withdrawals::list_user_withdrawals))
        .route("/referrals", post(referrals::create_referral))
        .route("/referrals/:id", get(referrals::get_referral))
        .route("/referrals/:id/complete", post(referrals::complete_referral))
        .route("/withdrawals", post(withdrawals::create_withdrawal))
        .route("/withdrawals/:id", get(withdrawals::get_withdrawal))
        .nest("/admin", admin_routes)
        .layer(axum::middleware::from_fn(
            middleware::request_logger::request_logger_middleware,
        ))
        .with_state(state)
}
