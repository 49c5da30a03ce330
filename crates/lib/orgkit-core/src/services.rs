//! Shared service wiring.
//!
//! One config store instance is constructed per process and injected into
//! every consumer; the HTTP client is shared across the GraphQL client and
//! the upload transfer path.

use std::sync::Arc;

use crate::config::ConfigStore;
use crate::graphql::GraphqlClient;
use crate::organization::OrganizationService;
use crate::upload::Uploader;

/// Bundle of core services built over one config store and HTTP client.
#[derive(Clone)]
pub struct CoreServices {
    config: Arc<ConfigStore>,
    graphql: GraphqlClient,
    uploader: Uploader,
    organization: OrganizationService,
}

impl CoreServices {
    #[must_use]
    pub fn new(config: Arc<ConfigStore>) -> Self {
        let http = reqwest::Client::new();
        let graphql = GraphqlClient::new(http.clone(), config.clone());
        let uploader = Uploader::new(http, config.clone());
        let organization = OrganizationService::new(graphql.clone(), config.clone());
        Self {
            config,
            graphql,
            uploader,
            organization,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    #[must_use]
    pub const fn graphql(&self) -> &GraphqlClient {
        &self.graphql
    }

    #[must_use]
    pub const fn uploader(&self) -> &Uploader {
        &self.uploader
    }

    #[must_use]
    pub const fn organization(&self) -> &OrganizationService {
        &self.organization
    }
}
