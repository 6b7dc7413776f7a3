// Lazily built, process-lifetime cache of type contracts.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::core::catalog::TypeCatalog;
use crate::core::contract::{ConstructionPlan, OverrideTable, TypeContract, resolve_construction};
use crate::core::error::{Error, ErrorKind};
use crate::core::type_key::TypeKey;

pub(crate) struct ContractResolver {
    catalog: TypeCatalog,
    overrides: OverrideTable,
    cache: RwLock<HashMap<TypeKey, Arc<TypeContract>>>,
}

impl ContractResolver {
    pub(crate) fn new(catalog: TypeCatalog, overrides: OverrideTable) -> Self {
        Self {
            catalog,
            overrides,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn contract(&self, key: TypeKey) -> Result<Arc<TypeContract>, Error> {
        {
            let cache = self.cache.read().map_err(|_| poisoned())?;
            if let Some(hit) = cache.get(&key) {
                return Ok(Arc::clone(hit));
            }
        }

        let descriptor = self.catalog.get(&key).ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("no type descriptor registered")
                .with_type(key.name())
                .with_hint("Register the type in the catalog or add a converter that claims it.")
        })?;
        let contract = Arc::new(TypeContract::build(&descriptor, self.overrides.get(&key))?);
        debug!(
            type_name = key.name(),
            shape = ?contract.shape(),
            members = contract.members().len(),
            "built type contract"
        );

        // Two sessions may race to build the same contract; the first insert wins.
        let mut cache = self.cache.write().map_err(|_| poisoned())?;
        Ok(Arc::clone(cache.entry(key).or_insert(contract)))
    }

    pub(crate) fn construction_plan(&self, key: TypeKey) -> Result<ConstructionPlan, Error> {
        let contract = self.contract(key)?;
        resolve_construction(&contract)
    }

    #[cfg(test)]
    pub(crate) fn cached(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }
}

fn poisoned() -> Error {
    Error::new(ErrorKind::Internal).with_message("contract cache lock poisoned")
}
