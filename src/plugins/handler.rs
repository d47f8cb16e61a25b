use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::Router;
use parking_lot::Mutex;
use plugin_api::{Plugin, PluginError};
use thiserror::Error;

use super::PLUGINS;

#[derive(Debug, Error, PartialEq)]
pub enum PluginContainerError {
    #[error("found duplicate entries in plugin registry")]
    DuplicateEntry,
    #[error("plugin container not loaded")]
    Unloaded,
    #[error("plugin errors: {0:?}")]
    PluginErrorMap(HashMap<String, PluginError>),
}

pub struct PluginContainer<'a> {
    loaded: bool,
    collected_routes: Vec<Router>,
    plugins: &'a Vec<Arc<Mutex<dyn Plugin>>>,
}

impl Default for PluginContainer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginContainer<'_> {
    /// Instantiate an object aware of all statically registered plugins
    pub fn new() -> Self {
        Self {
            loaded: false,
            collected_routes: vec![],
            plugins: &*PLUGINS,
        }
    }

    /// Search loaded plugin based on name string
    pub fn find_plugin(&self, name: &str) -> Option<Arc<Mutex<dyn Plugin>>> {
        self.plugins
            .iter()
            .find(|plugin| plugin.lock().name() == name)
            .cloned()
    }

    /// Load referenced plugins
    ///
    /// This entails mounting them and merging their routes internally (only
    /// upon successful initialization). An error is returned if plugins
    /// bearing the same name are found. Also, all plugins failing to be
    /// initialized are returned in a map with respectively raised errors.
    pub fn load(&mut self) -> Result<(), PluginContainerError> {
        tracing::debug!("loading plugin container");

        // Checking for duplicates
        let unique_plugins: HashSet<_> = self.plugins.iter().map(|p| p.lock().name()).collect();
        if unique_plugins.len() != self.plugins.len() {
            tracing::error!("found duplicate entries in plugin registry");
            return Err(PluginContainerError::DuplicateEntry);
        }

        // Reset collection of routes
        self.collected_routes.truncate(0);

        // Mount plugins and collect routes on successful status
        let errors: HashMap<_, _> = self
            .plugins
            .iter()
            .filter_map(|plugin| {
                let mut plugin = plugin.lock();
                match plugin.mount().and_then(|_| plugin.routes()) {
                    Ok(routes) => {
                        tracing::info!("mounted plugin {}", plugin.name());
                        self.collected_routes.push(routes);
                        None
                    }
                    Err(err) => {
                        tracing::error!("error mounting plugin {}: {err}", plugin.name());
                        Some((plugin.name().to_string(), err))
                    }
                }
            })
            .collect();

        // Flag as loaded
        self.loaded = true;

        // Return state of completion
        if errors.is_empty() {
            tracing::debug!("plugin container loaded");
            Ok(())
        } else {
            Err(PluginContainerError::PluginErrorMap(errors))
        }
    }

    /// Unload all plugins, reporting those failing to unmount.
    pub fn unload(&mut self) -> Result<(), PluginContainerError> {
        if !self.loaded {
            return Err(PluginContainerError::Unloaded);
        }

        let errors: HashMap<_, _> = self
            .plugins
            .iter()
            .filter_map(|plugin| {
                let plugin = plugin.lock();
                match plugin.unmount() {
                    Ok(_) => {
                        tracing::info!("unmounted plugin {}", plugin.name());
                        None
                    }
                    Err(err) => {
                        tracing::error!("error unmounting plugin {}: {err}", plugin.name());
                        Some((plugin.name().to_string(), err))
                    }
                }
            })
            .collect();

        self.collected_routes.truncate(0);
        self.loaded = false;

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PluginContainerError::PluginErrorMap(errors))
        }
    }

    /// Merge collected routes from all plugins successfully initialized.
    pub fn routes(&self) -> Result<Router, PluginContainerError> {
        if self.loaded {
            Ok(self
                .collected_routes
                .iter()
                .fold(Router::new(), |acc, e| acc.merge(e.clone())))
        } else {
            Err(PluginContainerError::Unloaded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    struct FirstPlugin;
    impl Plugin for FirstPlugin {
        fn name(&self) -> &'static str {
            "first"
        }

        fn mount(&mut self) -> Result<(), PluginError> {
            Ok(())
        }

        fn unmount(&self) -> Result<(), PluginError> {
            Ok(())
        }

        fn routes(&self) -> Result<Router, PluginError> {
            Ok(Router::new().route("/first", get(|| async {})))
        }
    }

    struct SecondPlugin;
    impl Plugin for SecondPlugin {
        fn name(&self) -> &'static str {
            "second"
        }

        fn mount(&mut self) -> Result<(), PluginError> {
            Ok(())
        }

        fn unmount(&self) -> Result<(), PluginError> {
            Ok(())
        }

        fn routes(&self) -> Result<Router, PluginError> {
            Ok(Router::new().route("/second", get(|| async {})))
        }
    }

    struct SecondAgainPlugin;
    impl Plugin for SecondAgainPlugin {
        fn name(&self) -> &'static str {
            "second"
        }

        fn mount(&mut self) -> Result<(), PluginError> {
            Ok(())
        }

        fn unmount(&self) -> Result<(), PluginError> {
            Ok(())
        }

        fn routes(&self) -> Result<Router, PluginError> {
            Ok(Router::new().route("/second", get(|| async {})))
        }
    }

    struct FaultyPlugin;
    impl Plugin for FaultyPlugin {
        fn name(&self) -> &'static str {
            "faulty"
        }

        fn mount(&mut self) -> Result<(), PluginError> {
            Err(PluginError::InitError("seed document missing".to_owned()))
        }

        fn unmount(&self) -> Result<(), PluginError> {
            Ok(())
        }

        fn routes(&self) -> Result<Router, PluginError> {
            Ok(Router::new().route("/faulty", get(|| async {})))
        }
    }

    #[test]
    fn test_loading() {
        let plugins: Vec<Arc<Mutex<dyn Plugin>>> = vec![
            Arc::new(Mutex::new(FirstPlugin {})),
            Arc::new(Mutex::new(SecondPlugin {})),
        ];
        let mut container = PluginContainer {
            loaded: false,
            collected_routes: vec![],
            plugins: &plugins,
        };

        assert!(container.load().is_ok());
        assert!(container.routes().is_ok());

        assert!(container.find_plugin("first").is_some());
        assert!(container.find_plugin("second").is_some());
        assert!(container.find_plugin("non-existent").is_none());

        assert_eq!(container.collected_routes.len(), 2);
    }

    #[test]
    fn test_double_loading() {
        let plugins: Vec<Arc<Mutex<dyn Plugin>>> = vec![
            Arc::new(Mutex::new(FirstPlugin {})),
            Arc::new(Mutex::new(SecondPlugin {})),
        ];
        let mut container = PluginContainer {
            loaded: false,
            collected_routes: vec![],
            plugins: &plugins,
        };

        assert!(container.load().is_ok());
        assert!(container.load().is_ok());

        assert_eq!(container.collected_routes.len(), 2);
    }

    #[test]
    fn test_loading_with_duplicates() {
        let plugins: Vec<Arc<Mutex<dyn Plugin>>> = vec![
            Arc::new(Mutex::new(SecondPlugin {})),
            Arc::new(Mutex::new(SecondAgainPlugin {})),
        ];
        let mut container = PluginContainer {
            loaded: false,
            collected_routes: vec![],
            plugins: &plugins,
        };

        assert_eq!(
            container.load().unwrap_err(),
            PluginContainerError::DuplicateEntry
        );
    }

    #[test]
    fn test_loading_with_failing_plugin() {
        let plugins: Vec<Arc<Mutex<dyn Plugin>>> = vec![
            Arc::new(Mutex::new(FirstPlugin {})),
            Arc::new(Mutex::new(FaultyPlugin {})),
        ];
        let mut container = PluginContainer {
            loaded: false,
            collected_routes: vec![],
            plugins: &plugins,
        };

        let err = container.load().unwrap_err();

        assert_eq!(
            err,
            PluginContainerError::PluginErrorMap(
                [(
                    "faulty".to_string(),
                    PluginError::InitError("seed document missing".to_owned())
                )]
                .into_iter()
                .collect()
            )
        );

        assert_eq!(container.collected_routes.len(), 1);
    }

    #[test]
    fn test_route_extraction_without_loading() {
        let plugins: Vec<Arc<Mutex<dyn Plugin>>> = vec![
            Arc::new(Mutex::new(FirstPlugin {})),
            Arc::new(Mutex::new(SecondPlugin {})),
        ];
        let container = PluginContainer {
            loaded: false,
            collected_routes: vec![],
            plugins: &plugins,
        };

        assert_eq!(
            container.routes().unwrap_err(),
            PluginContainerError::Unloaded
        );
    }

    #[test]
    fn test_unloading() {
        let plugins: Vec<Arc<Mutex<dyn Plugin>>> = vec![Arc::new(Mutex::new(FirstPlugin {}))];
        let mut container = PluginContainer {
            loaded: false,
            collected_routes: vec![],
            plugins: &plugins,
        };

        assert_eq!(
            container.unload().unwrap_err(),
            PluginContainerError::Unloaded
        );

        container.load().unwrap();
        assert!(container.unload().is_ok());
        assert!(container.routes().is_err());
    }
}
