// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Create-or-update of the local account behind an SSO identity.
//!
//! Both paths converge on the same full-overwrite update, so running the
//! provisioner twice with the same identity leaves the directory unchanged.
//!
//! Creation and group assignment are separate directory calls. A failure in
//! the follow-up update leaves the account created without its groups; it is
//! logged for operators and reported as a failed outcome, never rolled back.

use std::sync::Arc;

use ring::rand::{SecureRandom, SystemRandom};
use tracing::{error, info};

use crate::providers::{NewUser, SystemActor, UserDirectory, UserId, UserUpdate};

const GENERATED_PASSWORD_LEN: usize = 20;
const PASSWORD_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// User-facing reason attached to every failed outcome.
pub const PROVISIONING_ERROR: &str = "provisioning error";

/// Identity attributes to synchronize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub email: String,
    pub username: String,
    pub roles: Vec<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    Created(UserId),
    Updated(UserId),
    Failed(String),
}

impl ProvisioningOutcome {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            ProvisioningOutcome::Created(id) | ProvisioningOutcome::Updated(id) => Some(id),
            ProvisioningOutcome::Failed(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct UserProvisioner {
    directory: Arc<dyn UserDirectory>,
    actor: SystemActor,
    rng: SystemRandom,
}

impl UserProvisioner {
    pub fn new(directory: Arc<dyn UserDirectory>, actor: SystemActor) -> Self {
        Self {
            directory,
            actor,
            rng: SystemRandom::new(),
        }
    }

    pub async fn provision(&self, request: &ProvisioningRequest) -> ProvisioningOutcome {
        let existing = match self
            .directory
            .find_user_by_email(&self.actor, &request.email)
            .await
        {
            Ok(existing) => existing,
            Err(e) => {
                error!(error = %e, "Directory lookup failed");
                return ProvisioningOutcome::Failed(PROVISIONING_ERROR.to_string());
            }
        };

        if let Some(id) = existing {
            return match self.update(&id, request).await {
                Ok(()) => {
                    info!(user_id = %id, "Updated SSO user");
                    ProvisioningOutcome::Updated(id)
                }
                Err(()) => ProvisioningOutcome::Failed(PROVISIONING_ERROR.to_string()),
            };
        }

        let password = match self.generate_password() {
            Ok(password) => password,
            Err(()) => {
                error!("System RNG failed while generating password");
                return ProvisioningOutcome::Failed(PROVISIONING_ERROR.to_string());
            }
        };
        let new_user = NewUser {
            username: request.username.clone(),
            email: request.email.clone(),
            avatar_url: request.avatar_url.clone().unwrap_or_default(),
            password,
            is_activated: true,
        };

        let id = match self.directory.create_user(&self.actor, &new_user).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "Directory create failed");
                return ProvisioningOutcome::Failed(PROVISIONING_ERROR.to_string());
            }
        };

        // Groups cannot be assigned on creation.
        match self.update(&id, request).await {
            Ok(()) => {
                info!(user_id = %id, "Created SSO user");
                ProvisioningOutcome::Created(id)
            }
            Err(()) => {
                error!(
                    user_id = %id,
                    "SSO user created but group assignment failed; account needs manual review"
                );
                ProvisioningOutcome::Failed(PROVISIONING_ERROR.to_string())
            }
        }
    }

    async fn update(&self, id: &UserId, request: &ProvisioningRequest) -> Result<(), ()> {
        let update = UserUpdate {
            username: request.username.clone(),
            avatar_url: request.avatar_url.clone().unwrap_or_default(),
            // An empty role list leaves membership untouched.
            group_ids: (!request.roles.is_empty()).then(|| request.roles.clone()),
        };

        self.directory
            .update_user(&self.actor, id, &update)
            .await
            .map_err(|e| error!(user_id = %id, error = %e, "Directory update failed"))
    }

    fn generate_password(&self) -> Result<String, ()> {
        let mut password = String::with_capacity(GENERATED_PASSWORD_LEN);
        let mut buf = [0u8; 32];
        // Rejection sampling keeps the alphabet uniform.
        let limit = (256 / PASSWORD_ALPHABET.len() * PASSWORD_ALPHABET.len()) as u8;
        while password.len() < GENERATED_PASSWORD_LEN {
            self.rng.fill(&mut buf).map_err(|_| ())?;
            for byte in buf.iter().copied().filter(|b| *b < limit) {
                if password.len() == GENERATED_PASSWORD_LEN {
                    break;
                }
                password.push(PASSWORD_ALPHABET[byte as usize % PASSWORD_ALPHABET.len()] as char);
            }
        }
        Ok(password)
    }
}
