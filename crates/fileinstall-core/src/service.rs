//! The reconciliation service
//!
//! [`FileInstaller`] owns one [`DirectoryMonitor`] per configured directory
//! and implements [`UpdateHandler`], persisting configuration changes from
//! the pipeline back into the monitored directories.

use crate::config::{HostSettings, PropertyContext, ScanConfiguration, ServiceSettings};
use crate::installer::Installer;
use crate::monitor::{self, DirectoryMonitor, MonitorOptions};
use crate::pipeline::{Attributes, InstallPipeline, UpdateHandler};
use crate::resource::{CONFIG_FILE_EXTENSION, Dictionary, ResourceType, UpdateResult};
use crate::scheme::{self, ResourceUrl};
use crate::serializer::{ConfigSerializer, JsonConfigSerializer};
use crate::snapshot::FileChange;
use crate::Result;
use fileinstall_fs::path::canonicalize_lenient;
use fileinstall_fs::{NormalizedPath, RobustnessConfig, io};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

/// First line of every file written back to disk.
pub const GENERATED_HEADER: &str = "// Configuration created by fileinstall\n";

/// Where a write-back lands.
#[derive(Debug)]
struct WriteTarget {
    scheme: String,
    path: NormalizedPath,
    /// Existing file in a non-canonical format, deleted once the new one is written
    replaces: Option<NormalizedPath>,
}

impl WriteTarget {
    fn url(&self) -> String {
        format!("{}:{}", self.scheme, self.path)
    }
}

/// Polls the configured directories and writes pipeline changes back to them.
pub struct FileInstaller {
    configurations: Vec<ScanConfiguration>,
    writeback: bool,
    auto_create: bool,
    serializer: Arc<dyn ConfigSerializer>,
    robustness: RobustnessConfig,
    monitors: RwLock<Vec<DirectoryMonitor>>,
}

impl FileInstaller {
    pub fn new(configurations: Vec<ScanConfiguration>, writeback: bool, auto_create: bool) -> Self {
        Self {
            configurations,
            writeback,
            auto_create,
            serializer: Arc::new(JsonConfigSerializer),
            robustness: RobustnessConfig::default(),
            monitors: RwLock::new(Vec::new()),
        }
    }

    /// Build a service from configuration keys.
    ///
    /// Returns the service together with the host settings found in `context`.
    pub fn from_properties(context: &PropertyContext) -> Result<(Self, HostSettings)> {
        let configurations = ScanConfiguration::from_properties(context)?;
        let settings = ServiceSettings::from_properties(context)?;
        let service = Self::new(configurations, settings.writeback, settings.auto_create);
        Ok((service, settings.host))
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn ConfigSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.robustness = robustness;
        self
    }

    pub fn configurations(&self) -> &[ScanConfiguration] {
        &self.configurations
    }

    /// Whether there is anything to monitor at all.
    pub fn has_configurations(&self) -> bool {
        !self.configurations.is_empty()
    }

    pub fn writeback_enabled(&self) -> bool {
        self.writeback
    }

    /// Create one stopped monitor per configuration, replacing any existing ones.
    ///
    /// Use [`FileInstaller::poll`] to drive the monitors by hand; [`FileInstaller::start`]
    /// attaches and starts them in one go.
    pub fn attach(&self, pipeline: Arc<dyn InstallPipeline>, settings: &HostSettings) {
        let monitors: Vec<DirectoryMonitor> = self
            .configurations
            .iter()
            .map(|config| self.create_monitor(config, &pipeline, settings))
            .collect();
        self.replace_monitors(monitors);
    }

    /// Create and start one monitor per configuration.
    ///
    /// Either every monitor is running afterwards or none is.
    ///
    /// # Errors
    ///
    /// Fails when a monitor thread cannot be spawned.
    pub fn start(&self, pipeline: Arc<dyn InstallPipeline>, settings: &HostSettings) -> Result<()> {
        if !self.has_configurations() {
            debug!("No directories configured, nothing to start");
            return Ok(());
        }

        let mut monitors = Vec::with_capacity(self.configurations.len());
        for config in &self.configurations {
            let mut monitor = self.create_monitor(config, &pipeline, settings);
            // Already started monitors are stopped on drop if this fails
            monitor.start()?;
            monitors.push(monitor);
        }

        info!(monitors = monitors.len(), writeback = self.writeback, "Started file installer");
        self.replace_monitors(monitors);
        Ok(())
    }

    /// Stop all monitors and forget them. Safe to call repeatedly.
    pub fn stop(&self) {
        // Taken out of the lock first so a handler call never waits on a thread join
        let monitors = std::mem::take(&mut *self.write_monitors());
        if monitors.is_empty() {
            return;
        }
        let count = monitors.len();
        for mut monitor in monitors {
            monitor.stop();
        }
        info!(monitors = count, "Stopped file installer");
    }

    /// Schemes of the current monitors, in configuration order.
    pub fn schemes(&self) -> Vec<String> {
        self.read_monitors()
            .iter()
            .map(|monitor| monitor.listener().scheme().to_string())
            .collect()
    }

    /// Roots of the current monitors, in configuration order.
    pub fn roots(&self) -> Vec<NormalizedPath> {
        self.read_monitors()
            .iter()
            .map(|monitor| monitor.root().clone())
            .collect()
    }

    /// Run one scan of every monitor on the calling thread.
    pub fn poll(&self) -> Vec<FileChange> {
        self.read_monitors().iter().flat_map(DirectoryMonitor::poll).collect()
    }

    fn create_monitor(
        &self,
        config: &ScanConfiguration,
        pipeline: &Arc<dyn InstallPipeline>,
        settings: &HostSettings,
    ) -> DirectoryMonitor {
        if self.auto_create {
            monitor::ensure_root(&NormalizedPath::new(&config.directory));
        }

        let canonical = canonicalize_lenient(&config.directory);
        let token = scheme::scheme_hash(&canonical, settings);
        let root = NormalizedPath::new(&canonical);
        debug!(directory = %root, token = %token, "Derived scheme for directory");

        let installer = Installer::new(Arc::clone(pipeline), root.clone(), &token).with_priority(config.priority);
        DirectoryMonitor::new(root, MonitorOptions::for_configuration(config, self.auto_create), installer)
    }

    fn replace_monitors(&self, monitors: Vec<DirectoryMonitor>) {
        let previous = std::mem::replace(&mut *self.write_monitors(), monitors);
        for mut monitor in previous {
            monitor.stop();
        }
    }

    fn read_monitors(&self) -> RwLockReadGuard<'_, Vec<DirectoryMonitor>> {
        self.monitors.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_monitors(&self) -> RwLockWriteGuard<'_, Vec<DirectoryMonitor>> {
        self.monitors.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_target(&self, id: &str, url: Option<&str>) -> Option<WriteTarget> {
        match url {
            Some(url) => {
                let parsed = match ResourceUrl::parse(url) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!(error = %e, "Ignoring update");
                        return None;
                    }
                };
                if parsed.path.has_suffix(CONFIG_FILE_EXTENSION) {
                    Some(WriteTarget {
                        scheme: parsed.scheme,
                        path: parsed.path,
                        replaces: None,
                    })
                } else {
                    Some(WriteTarget {
                        scheme: parsed.scheme,
                        path: parsed.path.with_suffix_replaced(CONFIG_FILE_EXTENSION),
                        replaces: Some(parsed.path),
                    })
                }
            }
            None => {
                let monitors = self.read_monitors();
                let Some(first) = monitors.first() else {
                    warn!(id = %id, "No monitored directory to write new configuration to");
                    return None;
                };
                Some(WriteTarget {
                    scheme: first.listener().scheme().to_string(),
                    path: first.root().join(&format!("{id}{CONFIG_FILE_EXTENSION}")),
                    replaces: None,
                })
            }
        }
    }

    fn write_back<F>(&self, resource_type: ResourceType, id: &str, url: Option<&str>, fill: F) -> Option<UpdateResult>
    where
        F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
    {
        if !self.writeback || resource_type != ResourceType::Config {
            return None;
        }
        let target = self.resolve_target(id, url)?;

        let written = io::write_atomic_with(&target.path, self.robustness, |w| {
            w.write_all(GENERATED_HEADER.as_bytes())?;
            fill(w)
        });
        if let Err(e) = written {
            error!(id = %id, path = %target.path, error = %e, "Failed to write configuration");
            return None;
        }

        if let Some(old) = &target.replaces
            && let Err(e) = io::remove_if_exists(old)
        {
            // The new file is already in place and is the copy that counts
            warn!(id = %id, path = %old, error = %e, "Failed to remove replaced configuration");
        }

        debug!(id = %id, path = %target.path, "Wrote configuration");
        Some(UpdateResult::moved(target.url()))
    }
}

impl UpdateHandler for FileInstaller {
    fn handle_removal(&self, resource_type: ResourceType, id: &str, url: &str) -> Option<UpdateResult> {
        if !self.writeback {
            return None;
        }
        let parsed = match ResourceUrl::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Ignoring removal");
                return None;
            }
        };

        match io::remove_if_exists(&parsed.path) {
            Ok(removed) => {
                debug!(%resource_type, id = %id, path = %parsed.path, removed, "Handled removal");
                Some(UpdateResult::new(parsed.to_string()))
            }
            Err(e) => {
                error!(id = %id, path = %parsed.path, error = %e, "Failed to remove file");
                None
            }
        }
    }

    fn handle_update(
        &self,
        resource_type: ResourceType,
        id: &str,
        url: Option<&str>,
        dictionary: &Dictionary,
        _attributes: &Attributes,
    ) -> Option<UpdateResult> {
        let serializer = Arc::clone(&self.serializer);
        self.write_back(resource_type, id, url, |w| serializer.serialize(dictionary, w))
    }

    fn handle_update_stream(
        &self,
        resource_type: ResourceType,
        id: &str,
        url: Option<&str>,
        content: &mut dyn Read,
        _attributes: &Attributes,
    ) -> Option<UpdateResult> {
        self.write_back(resource_type, id, url, |w| std::io::copy(content, w).map(|_| ()))
    }
}

impl Drop for FileInstaller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for FileInstaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileInstaller")
            .field("configurations", &self.configurations)
            .field("writeback", &self.writeback)
            .field("auto_create", &self.auto_create)
            .field("monitors", &*self.read_monitors())
            .finish_non_exhaustive()
    }
}
