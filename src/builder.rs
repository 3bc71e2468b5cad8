use std::sync::Arc;

use crate::{
    decorator::{LoggingDecorator, ValidationDecorator},
    dispatcher::{Dispatcher, Pipeline},
    kind::{Command, Kind, Query},
    settings::{Behavior, LogSettings, PipelineConfig, ValidationSettings},
    validation::{ValidationRunner, ValidatorRegistry, WrapperCatalog},
};

/// Composes decorators around a base dispatcher.
///
/// `PipelineBuilder` is the only way to get a [`Pipeline`]. Behaviors are
/// applied in the order they are added: the first wraps the base dispatcher
/// directly, each later one wraps everything before it, and the last one
/// added is the outermost and sees a request first.
///
/// Every validation behavior in the chain shares one [`ValidatorRegistry`].
///
/// # Examples
///
/// ```
/// use dispatch_decorators::{
///     Describe, LogSettings, PipelineBuilder, Query, Request, Router, ValidationSettings,
///     handler_fn,
/// };
///
/// struct Ping;
/// impl Describe for Ping {
///     fn describe(&self) -> Vec<(&'static str, Option<String>)> {
///         Vec::new()
///     }
/// }
/// impl Request for Ping {
///     type Kind = Query;
///     type Output = ();
/// }
///
/// let router = Router::<Query>::new().route(handler_fn(|_: &Ping| Ok(())));
///
/// // logging is outermost: it also logs requests that fail validation
/// let builder = PipelineBuilder::new(router)
///     .with_validation(ValidationSettings::new())
///     .with_logging(LogSettings::new());
///
/// assert_eq!(builder.behaviors().len(), 2);
/// let pipeline = builder.build();
/// ```
pub struct PipelineBuilder<K: Kind> {
    base: Arc<dyn Dispatcher<K>>,
    validators: Arc<ValidatorRegistry>,
    wrappers: WrapperCatalog,
    behaviors: Vec<Behavior>,
}

/// Builder for the command pipeline.
pub type CommandPipelineBuilder = PipelineBuilder<Command>;

/// Builder for the query pipeline.
pub type QueryPipelineBuilder = PipelineBuilder<Query>;

impl<K: Kind> PipelineBuilder<K> {
    /// Starts a chain around `base`.
    pub fn new(base: impl Dispatcher<K> + 'static) -> Self {
        Self::from_shared(Arc::new(base))
    }

    /// Starts a chain around an already shared dispatcher.
    pub fn from_shared(base: Arc<dyn Dispatcher<K>>) -> Self {
        Self {
            base,
            validators: Arc::new(ValidatorRegistry::new()),
            wrappers: WrapperCatalog::new(),
            behaviors: Vec::new(),
        }
    }

    /// Sets the validators consulted by every validation behavior.
    pub fn with_validators(mut self, validators: Arc<ValidatorRegistry>) -> Self {
        self.validators = validators;
        self
    }

    /// Sets the catalog used to resolve wrapper kinds given by name.
    pub fn with_wrappers(mut self, wrappers: WrapperCatalog) -> Self {
        self.wrappers = wrappers;
        self
    }

    /// Adds `behavior` as the new outermost layer.
    pub fn compose(mut self, behavior: Behavior) -> Self {
        self.behaviors.push(behavior);
        self
    }

    /// Adds a logging layer.
    pub fn with_logging(self, settings: LogSettings) -> Self {
        self.compose(Behavior::Logging(settings))
    }

    /// Adds a validation layer.
    pub fn with_validation(self, settings: ValidationSettings) -> Self {
        self.compose(Behavior::Validation(settings))
    }

    /// Adds each behavior in turn.
    pub fn compose_all(self, behaviors: impl IntoIterator<Item = Behavior>) -> Self {
        behaviors.into_iter().fold(self, Self::compose)
    }

    /// Adds the behaviors `config` lists for this pipeline's kind.
    pub fn configure(self, config: &PipelineConfig) -> Self {
        self.compose_all(config.behaviors_for(K::KIND).iter().cloned())
    }

    /// Returns the behaviors added so far, innermost first.
    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    /// Composes the chain.
    ///
    /// Wrapper kinds given by name are looked up in the catalog here. A name
    /// the catalog does not know is kept, and reported as a
    /// [`ConfigError`](crate::ConfigError) the first time a request fails
    /// validation.
    pub fn build(self) -> Pipeline<K> {
        let Self {
            base,
            validators,
            wrappers,
            behaviors,
        } = self;

        let runner = ValidationRunner::new(validators);
        let chain = behaviors
            .into_iter()
            .fold(base, |inner, behavior| -> Arc<dyn Dispatcher<K>> {
                match behavior {
                    Behavior::Logging(settings) => Arc::new(LoggingDecorator::new(inner, settings)),
                    Behavior::Validation(settings) => Arc::new(ValidationDecorator::new(
                        inner,
                        runner.clone(),
                        settings.resolve(&wrappers),
                    )),
                }
            });

        let kind = K::KIND;
        tracing::debug!(%kind, "pipeline composed");
        Pipeline::new(chain)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::error::{DispatchError, ValidationError};
    use crate::kind::RequestKind;
    use crate::message::{Describe, Envelope, Field, Reply, Request};
    use crate::validation::{ValidationFailure, WrapValidation, validator_fn};

    struct Archive {
        id: u32,
    }

    impl Describe for Archive {
        fn describe(&self) -> Vec<Field> {
            vec![("id", Some(self.id.to_string()))]
        }
    }

    impl Request for Archive {
        type Kind = Command;
        type Output = ();
    }

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct Refused {
        message: String,
        #[source]
        cause: ValidationError,
    }

    impl WrapValidation for Refused {
        fn wrap(message: String, cause: ValidationError) -> Self {
            Self { message, cause }
        }
    }

    #[derive(Default)]
    struct Archiver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Dispatcher<Command> for Archiver {
        async fn dispatch(
            &self,
            _request: Envelope,
            _cancellation: CancellationToken,
        ) -> Result<Reply, DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Reply::new(()))
        }
    }

    fn validators() -> Arc<ValidatorRegistry> {
        Arc::new(
            ValidatorRegistry::new().register::<Archive, _>(validator_fn(|a: &Archive| {
                if a.id == 0 {
                    vec![ValidationFailure::new("Positive", "id", "id must be positive")]
                } else {
                    Vec::new()
                }
            })),
        )
    }

    #[tokio::test]
    async fn empty_chain_dispatches_to_base() {
        let base = Arc::new(Archiver::default());
        let pipeline = PipelineBuilder::<Command>::from_shared(base.clone()).build();

        pipeline.dispatch(Archive { id: 0 }).await.unwrap();
        assert_eq!(base.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn validation_layer_rejects_before_base() {
        let base = Arc::new(Archiver::default());
        let pipeline = PipelineBuilder::<Command>::from_shared(base.clone())
            .with_validators(validators())
            .with_logging(LogSettings::new())
            .with_validation(ValidationSettings::new())
            .build();

        let err = pipeline.dispatch(Archive { id: 0 }).await.unwrap_err();
        assert_eq!(err.validation().unwrap().kind(), RequestKind::Command);
        assert_eq!(base.calls.load(Ordering::SeqCst), 0);

        pipeline.dispatch(Archive { id: 7 }).await.unwrap();
        assert_eq!(base.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn named_wrapper_is_resolved_from_catalog() {
        let config = PipelineConfig::from_json(
            r#"{ "commands": [ { "behavior": "validation", "wrapper_failure_kind": "Refused" } ] }"#,
        )
        .unwrap();

        let pipeline = PipelineBuilder::new(Archiver::default())
            .with_validators(validators())
            .with_wrappers(WrapperCatalog::new().register::<Refused>())
            .configure(&config)
            .build();

        let err = pipeline.dispatch(Archive { id: 0 }).await.unwrap_err();
        let refused = err.wrapped::<Refused>().expect("wrapped in Refused");
        assert_eq!(refused.cause.errors(), ["Positive - id - id must be positive"]);
    }

    #[test]
    fn configure_picks_the_matching_list() {
        let config = PipelineConfig {
            commands: vec![Behavior::Logging(LogSettings::verbose())],
            queries: vec![
                Behavior::Validation(ValidationSettings::new()),
                Behavior::Logging(LogSettings::new()),
            ],
        };

        let builder = PipelineBuilder::new(Archiver::default()).configure(&config);
        assert_eq!(builder.behaviors(), config.commands.as_slice());
    }

    #[test]
    fn behaviors_keep_insertion_order() {
        let builder = PipelineBuilder::new(Archiver::default())
            .with_logging(LogSettings::new())
            .with_validation(ValidationSettings::new());

        let names: Vec<_> = builder.behaviors().iter().map(Behavior::name).collect();
        assert_eq!(names, ["logging", "validation"]);
    }
}
