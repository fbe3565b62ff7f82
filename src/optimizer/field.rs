//! Field-wide scoring on the tokio runtime

use futures::future::join_all;
use tracing::{debug, error};

use super::{StrategyOptimizer, StrategyOutcome, StrategyRequest};
use crate::{Result, StrategyError};

impl StrategyOptimizer {
    /// Recommend for every request concurrently, one blocking task per vehicle.
    ///
    /// Results come back in request order. A task that panics yields
    /// `StrategyError::Worker` for its vehicle only.
    pub async fn recommend_field_concurrent(
        &self,
        requests: Vec<StrategyRequest>,
    ) -> Vec<Result<StrategyOutcome>> {
        debug!(vehicles = requests.len(), "Starting concurrent field pass");

        let tasks = requests.into_iter().map(|request| {
            let optimizer = self.clone();
            let vehicle_id = request.state.vehicle_id.clone();
            let handle = tokio::task::spawn_blocking(move || optimizer.recommend(&request));
            async move {
                match handle.await {
                    Ok(result) => result,
                    Err(join_error) => {
                        error!(vehicle_id = %vehicle_id, error = %join_error, "Scoring task failed");
                        Err(StrategyError::Worker {
                            details: format!("scoring task for '{vehicle_id}' failed: {join_error}"),
                        })
                    }
                }
            }
        });

        join_all(tasks).await
    }
}
