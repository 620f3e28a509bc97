//! Quill - an extensible grammar engine core.
//!
//! Addons register vocabulary (types, converters, comparators, expressions,
//! effects, sections, events, context values and tags) into a shared
//! catalog. Scripts are assembled from that vocabulary into triggers, which
//! the walk engine runs.
//!
//! # Crates
//!
//! - [`diagnostic`]: recoverable problems and their codes
//! - [`types`]: values, the type registry, converters and comparison
//! - [`pattern`]: grammar strings and match priority
//! - [`lang`]: syntax element traits, trigger assembly and execution
//! - [`registry`]: addon registration and the catalog
//!
//! # Debugging
//!
//! Set `RUST_LOG` and call [`init_tracing`]:
//! - `RUST_LOG=quill_registry=debug` - what each registration published
//! - `RUST_LOG=quill_types=trace` - how comparators were resolved
//! - `RUST_LOG=quill_lang=trace` - every statement transition

use std::sync::Once;

pub use quill_diagnostic as diagnostic;
pub use quill_lang as lang;
pub use quill_pattern as pattern;
pub use quill_registry as registry;
pub use quill_types as types;

use quill_diagnostic::Diagnostic;
use quill_lang::{Trigger, TriggerContext};
use quill_registry::{register_core, Catalog, CatalogConfig, RegistrationError, SyntaxRegistration};
use quill_types::{Relation, Value};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// The process-wide engine: a catalog holding the core vocabulary.
///
/// Create one per process (or per test) and pass it where vocabulary is
/// registered or looked up. Clones share the catalog.
#[derive(Clone, Debug)]
pub struct Runtime {
    catalog: Catalog,
}

impl Runtime {
    pub fn new() -> Result<Self, RegistrationError> {
        Self::with_config(CatalogConfig::default())
    }

    pub fn with_config(config: CatalogConfig) -> Result<Self, RegistrationError> {
        let catalog = Catalog::with_config(config);
        for diagnostic in register_core(&catalog)? {
            tracing::warn!(%diagnostic, "core vocabulary");
        }
        Ok(Runtime { catalog })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Publish an addon's declarations.
    pub fn register(
        &self,
        registration: SyntaxRegistration,
    ) -> Result<Vec<Diagnostic>, RegistrationError> {
        registration.register(&self.catalog)
    }

    /// Compare two possibly missing values with the registered comparators.
    pub fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> Relation {
        self.catalog.read().types().compare(a, b)
    }

    /// Fire `trigger` with `context`.
    ///
    /// Registration waits until the trigger has finished.
    pub fn run(&self, trigger: &Trigger, context: &dyn TriggerContext) -> bool {
        let state = self.catalog.read();
        trigger.run(context, state.types())
    }
}
