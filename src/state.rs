// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{
    config::Config,
    providers::UserDirectory,
    session::SessionStore,
    sso::{AuthSessionBinder, NonceGuard, SsoPipeline, UserProvisioner},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<dyn SessionStore>,
    pub directory: Arc<dyn UserDirectory>,
    pub pipeline: Arc<SsoPipeline>,
}

impl AppState {
    pub fn new(
        config: Config,
        sessions: Arc<dyn SessionStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let pipeline = SsoPipeline::new(
            config.sso_secret.clone(),
            NonceGuard::new(Arc::clone(&sessions)),
            UserProvisioner::new(Arc::clone(&directory), config.system_actor()),
            AuthSessionBinder::new(Arc::clone(&sessions), config.default_redirect_url.clone()),
        );

        Self {
            config: Arc::new(config),
            sessions,
            directory,
            pipeline: Arc::new(pipeline),
        }
    }
}
