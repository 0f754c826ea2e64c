// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;
use std::time::Duration;

use dill::{component, interface};
use secure_search::*;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const MIN_READINESS_POLL_INTERVAL: Duration = Duration::from_millis(1);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct IngestionCoordinatorImpl {
    config: Arc<IngestionConfig>,
    embedding_client: Arc<dyn EmbeddingClient>,
    vector_index: Arc<dyn VectorIndexClient>,
    authorization_client: Arc<dyn AuthorizationClient>,
    decision_cache: Arc<dyn DecisionCache>,
}

#[component(pub)]
#[interface(dyn IngestionCoordinator)]
impl IngestionCoordinatorImpl {
    pub fn new(
        config: Arc<IngestionConfig>,
        embedding_client: Arc<dyn EmbeddingClient>,
        vector_index: Arc<dyn VectorIndexClient>,
        authorization_client: Arc<dyn AuthorizationClient>,
        decision_cache: Arc<dyn DecisionCache>,
    ) -> Self {
        Self {
            config,
            embedding_client,
            vector_index,
            authorization_client,
            decision_cache,
        }
    }

    fn build_payload(&self, resource_id: &str, content: &str) -> serde_json::Value {
        if self.config.payload_include_content {
            serde_json::json!({
                "resource_id": resource_id,
                "text": content,
            })
        } else {
            serde_json::json!({
                "resource_id": resource_id,
            })
        }
    }

    async fn grant_viewer(&self, subject_id: &str, resource_id: &str) -> Result<(), AdmitError> {
        let tuple = Tuple::viewer(subject_id, resource_id);

        let source = match self
            .authorization_client
            .write(&[TupleWrite::Grant(tuple.clone())])
            .await
        {
            Ok(()) | Err(WriteTuplesError::AlreadyExists) => {
                // A previously cached deny must not outlive the grant
                self.decision_cache.invalidate(&tuple).await;
                return Ok(());
            }
            Err(WriteTuplesError::Service(e)) => e,
            Err(e @ WriteTuplesError::NotFound) => {
                AuthorizationServiceError::BadResponse(Box::new(e))
            }
        };

        tracing::error!(
            subject_id,
            resource_id,
            error = ?source,
            error_msg = %source,
            "Resource was indexed but the viewer tuple could not be written",
        );

        Err(PartialIngestionError {
            subject_id: subject_id.to_string(),
            resource_id: resource_id.to_string(),
            source,
        }
        .into())
    }
}

#[async_trait::async_trait]
impl IngestionCoordinator for IngestionCoordinatorImpl {
    #[tracing::instrument(
        level = "info",
        name = "IngestionCoordinatorImpl::admit",
        skip_all,
        fields(%subject_id, %resource_id)
    )]
    async fn admit(
        &self,
        subject_id: &str,
        resource_id: &str,
        content: &str,
    ) -> Result<(), AdmitError> {
        let vector = self.embedding_client.embed(content).await?;

        self.vector_index.delete(resource_id).await?;
        self.vector_index
            .upsert(resource_id, vector, self.build_payload(resource_id, content))
            .await?;

        self.grant_viewer(subject_id, resource_id).await?;

        if self.config.wait_until_searchable {
            self.wait_until_searchable(resource_id).await?;
        }

        tracing::info!(subject_id, resource_id, "Resource admitted");
        Ok(())
    }

    #[tracing::instrument(
        level = "info",
        name = "IngestionCoordinatorImpl::revoke",
        skip_all,
        fields(%subject_id, %resource_id)
    )]
    async fn revoke(&self, subject_id: &str, resource_id: &str) -> Result<(), RevokeError> {
        let tuple = Tuple::viewer(subject_id, resource_id);

        match self
            .authorization_client
            .write(&[TupleWrite::Revoke(tuple)])
            .await
        {
            Ok(()) | Err(WriteTuplesError::NotFound) => {}
            Err(WriteTuplesError::Service(e)) => return Err(e.into()),
            Err(e @ WriteTuplesError::AlreadyExists) => {
                return Err(AuthorizationServiceError::BadResponse(Box::new(e)).into());
            }
        }

        // Other cached decisions may have been derived from the revoked tuple
        self.decision_cache.clear().await;

        tracing::info!(subject_id, resource_id, "Viewer access revoked");
        Ok(())
    }

    #[tracing::instrument(
        level = "info",
        name = "IngestionCoordinatorImpl::remove",
        skip_all,
        fields(%resource_id)
    )]
    async fn remove(&self, resource_id: &str) -> Result<(), RemoveError> {
        self.vector_index.delete(resource_id).await?;

        tracing::info!(resource_id, "Resource removed from the index");
        Ok(())
    }

    #[tracing::instrument(
        level = "debug",
        name = "IngestionCoordinatorImpl::wait_until_searchable",
        skip_all,
        fields(%resource_id)
    )]
    async fn wait_until_searchable(&self, resource_id: &str) -> Result<(), AdmitError> {
        let max_wait = self.vector_index.indexing_lag_bound() + self.config.readiness_timeout;
        let poll_interval = self
            .config
            .readiness_poll_interval
            .max(MIN_READINESS_POLL_INTERVAL);

        let poll = RetryIf::spawn(
            FixedInterval::new(poll_interval),
            || async {
                match self.vector_index.contains(resource_id).await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(ReadinessPollError::NotYetVisible),
                    Err(e) => Err(ReadinessPollError::Index(e)),
                }
            },
            |e: &ReadinessPollError| matches!(e, ReadinessPollError::NotYetVisible),
        );

        match tokio::time::timeout(max_wait, poll).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(ReadinessPollError::Index(e))) => Err(e.into()),
            Ok(Err(ReadinessPollError::NotYetVisible)) | Err(_) => {
                tracing::warn!(resource_id, ?max_wait, "Resource did not become searchable");
                Err(IndexNotReadyError {
                    resource_id: resource_id.to_string(),
                    waited: max_wait,
                }
                .into())
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

enum ReadinessPollError {
    NotYetVisible,
    Index(IndexError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
