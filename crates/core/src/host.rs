//! Host lifecycle
//!
//! An [`InjectableHost`] owns an explicit list of declarations and drives them
//! through three phases:
//!
//! 1. [`pre_init`](InjectableHost::pre_init) attaches a fresh resolver and an
//!    empty name map.
//! 2. [`init`](InjectableHost::init) flattens every declaration chain, resolves
//!    the load order, prunes whatever cannot load, then injects the rest.
//! 3. [`uninit`](InjectableHost::uninit) ejects everything, dependents first.
//!
//! Failures of individual inject/eject actions never abort a phase. They are
//! logged and collected into a [`LifecycleReport`].

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::command::CommandRegistry;
use crate::config::{DuplicatePolicy, InjectorConfig};
use crate::error::{Error, Result};
use crate::inject::{InjectionDescriptor, OwnerContext};
use crate::resolver::DependencyResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Declared,
    PreInitialized,
    Initialized,
    Uninitialized,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Declared => "declared",
            Phase::PreInitialized => "pre-initialized",
            Phase::Initialized => "initialized",
            Phase::Uninitialized => "uninitialized",
        };
        f.write_str(name)
    }
}

/// Per-host resolver and name map, alive between `pre_init` and `uninit`
#[derive(Debug, Default)]
struct LifecycleState {
    resolver: DependencyResolver,
    injections: IndexMap<String, Arc<InjectionDescriptor>>,
}

/// What discovery and pruning decided, before anything is injected
#[derive(Debug, Default)]
struct Resolution {
    load_order: Vec<String>,
    pruned: Vec<String>,
    disabled: Vec<String>,
}

/// Result of a single inject or eject action
#[derive(Debug)]
pub struct InjectionOutcome {
    pub name: String,
    pub result: Result<()>,
}

impl InjectionOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a lifecycle phase did
#[derive(Debug, Default)]
pub struct LifecycleReport {
    /// Injections dropped because a prerequisite is missing or cyclic
    pub pruned: Vec<String>,
    /// Injections dropped by configuration
    pub disabled: Vec<String>,
    /// Actions in the order they ran
    pub outcomes: Vec<InjectionOutcome>,
}

impl LifecycleReport {
    pub fn order(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn succeeded(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_ok())
            .map(|o| o.name.as_str())
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &InjectionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn is_clean(&self) -> bool {
        self.pruned.is_empty() && self.failures().next().is_none()
    }
}

/// Side-effect free preview of what `init` and `uninit` would do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub owner: String,
    pub load_order: Vec<String>,
    pub unsatisfied: Vec<String>,
    pub disabled: Vec<String>,
    pub unload_order: Vec<String>,
    /// Effective prerequisites of every discovered injection, chain ordering
    /// and configured extras included
    pub prerequisites: IndexMap<String, Vec<String>>,
}

/// An object that carries injection declarations
#[derive(Debug)]
pub struct InjectableHost {
    owner: OwnerContext,
    config: InjectorConfig,
    declarations: Vec<Arc<InjectionDescriptor>>,
    state: Option<LifecycleState>,
    phase: Phase,
}

impl InjectableHost {
    pub fn new(owner: impl Into<String>) -> Self {
        Self::with_config(owner, InjectorConfig::default())
    }

    pub fn with_config(owner: impl Into<String>, config: InjectorConfig) -> Self {
        Self {
            owner: OwnerContext::new(owner),
            config,
            declarations: Vec::new(),
            state: None,
            phase: Phase::Declared,
        }
    }

    /// Add a declaration. Only the head of a chain needs to be declared; the
    /// descriptors it wraps are discovered from it.
    pub fn declare(&mut self, descriptor: impl Into<Arc<InjectionDescriptor>>) -> &mut Self {
        self.declarations.push(descriptor.into());
        self
    }

    pub fn with_declaration(mut self, descriptor: impl Into<Arc<InjectionDescriptor>>) -> Self {
        self.declare(descriptor);
        self
    }

    pub fn owner(&self) -> &OwnerContext {
        &self.owner
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.config
    }

    pub fn declarations(&self) -> &[Arc<InjectionDescriptor>] {
        &self.declarations
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Names currently tracked by the lifecycle state, in discovery order
    pub fn injection_names(&self) -> Vec<&str> {
        self.state
            .as_ref()
            .map(|state| state.injections.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn expect_phase(&self, allowed: &[Phase], operation: &str) -> Result<()> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        Err(Error::LifecycleError(format!(
            "cannot {operation} host '{}' while it is {}",
            self.owner.name(),
            self.phase
        )))
    }

    pub fn pre_init(&mut self) -> Result<()> {
        self.expect_phase(&[Phase::Declared, Phase::Uninitialized], "pre-init")?;
        debug!("Pre-initializing host '{}'", self.owner.name());
        self.state = Some(LifecycleState::default());
        self.phase = Phase::PreInitialized;
        Ok(())
    }

    pub fn init(&mut self, registry: &mut dyn CommandRegistry) -> Result<LifecycleReport> {
        self.expect_phase(&[Phase::PreInitialized], "init")?;
        let mut state = self.state.take().ok_or_else(|| {
            Error::LifecycleError(format!("host '{}' has no lifecycle state", self.owner.name()))
        })?;

        let resolution = match self.resolve_into(&mut state) {
            Ok(resolution) => resolution,
            Err(e) => {
                self.state = Some(state);
                return Err(e);
            }
        };

        let mut report = LifecycleReport {
            pruned: resolution.pruned,
            disabled: resolution.disabled,
            outcomes: Vec::new(),
        };

        for name in resolution.load_order {
            let Some(descriptor) = state.injections.get(&name) else {
                continue;
            };
            debug!("Injecting '{}' into '{}'", name, self.owner.name());
            let result = descriptor.inject(registry, &self.owner);
            if let Err(e) = &result {
                error!("Failed to inject '{}': {}", name, e);
            }
            report.outcomes.push(InjectionOutcome { name, result });
        }

        info!(
            "Host '{}' initialized: {} injected, {} failed, {} pruned",
            self.owner.name(),
            report.succeeded().len(),
            report.failures().count(),
            report.pruned.len()
        );

        self.state = Some(state);
        self.phase = Phase::Initialized;
        Ok(report)
    }

    pub fn uninit(&mut self, registry: &mut dyn CommandRegistry) -> Result<LifecycleReport> {
        self.expect_phase(&[Phase::Initialized], "uninit")?;
        let state = self.state.take().ok_or_else(|| {
            Error::LifecycleError(format!("host '{}' has no lifecycle state", self.owner.name()))
        })?;

        let mut report = LifecycleReport::default();
        for name in state.resolver.get_dependents_multiple(state.resolver.names()) {
            let Some(descriptor) = state.injections.get(&name) else {
                continue;
            };
            debug!("Ejecting '{}' from '{}'", name, self.owner.name());
            let result = descriptor.eject(registry);
            if let Err(e) = &result {
                error!("Failed to eject '{}': {}", name, e);
            }
            report.outcomes.push(InjectionOutcome { name, result });
        }

        self.phase = Phase::Uninitialized;
        Ok(report)
    }

    /// Resolve the declarations without touching any registry or the host's
    /// own lifecycle state
    pub fn plan(&self) -> Result<Plan> {
        let mut state = LifecycleState::default();
        let prerequisites: IndexMap<String, Vec<String>> = self
            .discover()?
            .into_iter()
            .map(|(name, (_, after))| (name, after.into_iter().collect()))
            .collect();
        let resolution = self.resolve_into(&mut state)?;

        Ok(Plan {
            owner: self.owner.name().to_string(),
            unload_order: state
                .resolver
                .get_dependents_multiple(state.resolver.names()),
            load_order: resolution.load_order,
            unsatisfied: resolution.pruned,
            disabled: resolution.disabled,
            prerequisites,
        })
    }

    /// Walk every declaration chain and compute each descriptor's effective
    /// prerequisites
    fn discover(&self) -> Result<IndexMap<String, (Arc<InjectionDescriptor>, IndexSet<String>)>> {
        let mut found: IndexMap<String, (Arc<InjectionDescriptor>, IndexSet<String>)> =
            IndexMap::new();

        for head in &self.declarations {
            let mut current = Some(head);
            while let Some(descriptor) = current {
                let name = descriptor.name().to_string();

                if let Some((existing, _)) = found.get(&name) {
                    // The same declaration reached twice; its tail is known too
                    if Arc::ptr_eq(existing, descriptor) {
                        break;
                    }
                    match self.config.duplicate_names {
                        DuplicatePolicy::Error => return Err(Error::DuplicateInjection(name)),
                        DuplicatePolicy::LastWins => {
                            warn!("Injection '{}' is declared more than once, keeping the last", name)
                        }
                    }
                }

                let mut after = descriptor.after().clone();
                if let Some(wrapped) = descriptor.next() {
                    after.insert(wrapped.name().to_string());
                }
                if let Some(extra) = self.config.extra_after.get(&name) {
                    after.extend(extra.iter().cloned());
                }

                found.insert(name, (Arc::clone(descriptor), after));
                current = descriptor.next();
            }
        }

        Ok(found)
    }

    fn resolve_into(&self, state: &mut LifecycleState) -> Result<Resolution> {
        let mut resolution = Resolution::default();

        for (name, (descriptor, after)) in self.discover()? {
            if self.config.is_disabled(&name) {
                info!("Injection '{}' is disabled by configuration", name);
                resolution.disabled.push(name);
                continue;
            }
            state.resolver.add_item(name.clone(), after);
            state.injections.insert(name, descriptor);
        }

        let resolved = state.resolver.get_state();
        if !resolved.unsatisfied.is_empty() {
            warn!(
                "These injections are missing required dependencies and will not be loaded: {}",
                resolved.unsatisfied.join(", ")
            );
            for name in &resolved.unsatisfied {
                state.resolver.remove_item(name);
                state.injections.shift_remove(name);
            }
        }

        resolution.load_order = resolved.satisfied;
        resolution.pruned = resolved.unsatisfied;
        Ok(resolution)
    }
}
