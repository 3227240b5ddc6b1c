use tracing::debug;
use vecbridge_core::{Dataset, IndexStruct, Result, VecbridgeError, VectorFactory, VectorType};

use crate::config::UpstashVectorConfig;
use crate::vector_store::UpstashVector;

/// Builds an [`UpstashVector`] per dataset from one shared config.
#[derive(Debug, Clone)]
pub struct UpstashVectorFactory {
    config: UpstashVectorConfig,
}

impl UpstashVectorFactory {
    pub fn new(config: UpstashVectorConfig) -> Self {
        Self { config }
    }

    /// Read credentials from `UPSTASH_VECTOR_REST_URL` / `UPSTASH_VECTOR_REST_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(UpstashVectorConfig::from_env()?))
    }

    pub fn config(&self) -> &UpstashVectorConfig {
        &self.config
    }
}

impl VectorFactory for UpstashVectorFactory {
    type Store = UpstashVector;

    fn init_vector(&self, dataset: &mut Dataset) -> Result<UpstashVector> {
        let collection_name = match dataset.index_struct()? {
            Some(index_struct) => index_struct.collection_name().to_string(),
            None => {
                let name = Dataset::gen_collection_name_by_id(&dataset.id);
                let index_struct = IndexStruct::new(VectorType::Upstash, name.as_str());
                dataset.index_struct = Some(serde_json::to_value(&index_struct).map_err(|e| {
                    VecbridgeError::Parsing(format!("failed to encode index struct: {e}"))
                })?);
                debug!(dataset = %dataset.id, collection = %name, "assigned new collection");
                name
            }
        };

        Ok(UpstashVector::new(collection_name, self.config.clone()))
    }
}
