use std::collections::HashMap;
use std::sync::Arc;
use super::traits::TransferWorkerFactory;

/// 后端注册表：名称 -> 工厂
#[derive(Default)]
pub struct BackendRegistry {
    factories: HashMap<String, Arc<dyn TransferWorkerFactory>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个后端工厂，同名注册会覆盖旧的
    pub fn register(&mut self, factory: Arc<dyn TransferWorkerFactory>) {
        self.factories.insert(factory.name().to_string(), factory);
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn TransferWorkerFactory>> {
        self.factories.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
