//! Lifecycle pipeline around a command handler
//!
//! ```text
//! BeforeAll -> BeforeEach -> Handler --ok--> AfterEach -> AfterAll -> Done
//!                               \--err--> OnError --/
//! ```
//!
//! `AfterEach` and `AfterAll` run whether or not the handler (or `on_error`)
//! failed. A failing handler never escapes: it is logged and turned into a
//! failed outcome. Hook failures are not routed to `on_error`; they abort the
//! remaining stages and propagate.

use super::context::CommandContext;
use super::definition::CommandDefinition;
use async_trait::async_trait;

/// Host lifecycle callbacks. Every method defaults to a no-op.
#[async_trait]
pub trait CommandHooks: Send + Sync {
    async fn before_all(&self, _name: &str, _context: &CommandContext) -> anyhow::Result<()> {
        Ok(())
    }

    async fn before_each(&self, _name: &str, _context: &CommandContext) -> anyhow::Result<()> {
        Ok(())
    }

    async fn after_each(&self, _name: &str, _context: &CommandContext) -> anyhow::Result<()> {
        Ok(())
    }

    async fn after_all(&self, _name: &str, _context: &CommandContext) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_error(
        &self,
        _name: &str,
        _context: &CommandContext,
        _error: &anyhow::Error,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BeforeAll,
    BeforeEach,
    Handler,
    OnError,
    AfterEach,
    AfterAll,
    Done,
}

/// Result of a dispatched command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Succeeded,
    Failed,
}

impl CommandOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandOutcome::Succeeded => 0,
            CommandOutcome::Failed => 1,
        }
    }
}

/// Run `definition`'s handler inside the hook pipeline.
pub async fn execute_with_hooks(
    definition: &CommandDefinition,
    context: &CommandContext,
    hooks: Option<&dyn CommandHooks>,
) -> anyhow::Result<CommandOutcome> {
    let name = definition.name.as_str();
    let mut stage = Stage::BeforeAll;
    let mut failure: Option<anyhow::Error> = None;
    let mut on_error_failure: Option<anyhow::Error> = None;

    while stage != Stage::Done {
        tracing::debug!(command = name, ?stage, "lifecycle stage");

        stage = match stage {
            Stage::BeforeAll => {
                if let Some(hooks) = hooks {
                    hooks.before_all(name, context).await?;
                }
                Stage::BeforeEach
            }
            Stage::BeforeEach => {
                if let Some(hooks) = hooks {
                    hooks.before_each(name, context).await?;
                }
                Stage::Handler
            }
            Stage::Handler => match definition.handler.run(context).await {
                Ok(()) => Stage::AfterEach,
                Err(error) => {
                    failure = Some(error);
                    Stage::OnError
                }
            },
            Stage::OnError => {
                if let (Some(hooks), Some(error)) = (hooks, failure.as_ref()) {
                    if let Err(hook_error) = hooks.on_error(name, context, error).await {
                        on_error_failure = Some(hook_error);
                    }
                }
                if let Some(error) = &failure {
                    context.logger.error(format!("Command failed: {:#}", error));
                }
                Stage::AfterEach
            }
            Stage::AfterEach => {
                if let Some(hooks) = hooks {
                    hooks.after_each(name, context).await?;
                }
                Stage::AfterAll
            }
            Stage::AfterAll => {
                if let Some(hooks) = hooks {
                    hooks.after_all(name, context).await?;
                }
                Stage::Done
            }
            Stage::Done => Stage::Done,
        };
    }

    if let Some(error) = on_error_failure {
        return Err(error.context(format!("onError hook failed for command \"{}\"", name)));
    }

    Ok(if failure.is_some() {
        CommandOutcome::Failed
    } else {
        CommandOutcome::Succeeded
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::context::test_support::{context, RecordingRunner};
    use crate::command::definition::CommandHandler;
    use std::sync::{Arc, Mutex};

    struct Handler {
        fail: bool,
        events: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl CommandHandler for Handler {
        async fn run(&self, _context: &CommandContext) -> anyhow::Result<()> {
            self.events.lock().unwrap().push("handler".to_string());
            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl Recorder {
        fn record(&self, event: &'static str) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(event.to_string());
            if self.fail_on == Some(event) {
                anyhow::bail!("{} failed", event);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CommandHooks for Recorder {
        async fn before_all(&self, _name: &str, _context: &CommandContext) -> anyhow::Result<()> {
            self.record("before_all")
        }

        async fn before_each(&self, _name: &str, _context: &CommandContext) -> anyhow::Result<()> {
            self.record("before_each")
        }

        async fn after_each(&self, _name: &str, _context: &CommandContext) -> anyhow::Result<()> {
            self.record("after_each")
        }

        async fn after_all(&self, _name: &str, _context: &CommandContext) -> anyhow::Result<()> {
            self.record("after_all")
        }

        async fn on_error(
            &self,
            _name: &str,
            _context: &CommandContext,
            error: &anyhow::Error,
        ) -> anyhow::Result<()> {
            assert_eq!(error.to_string(), "boom");
            self.record("on_error")
        }
    }

    fn setup(
        fail: bool,
        fail_on: Option<&'static str>,
    ) -> (CommandDefinition, Recorder, Arc<Mutex<Vec<String>>>, CommandContext, tempfile::TempDir) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let handler = Handler {
            fail,
            events: events.clone(),
        };
        let definition = CommandDefinition::new("build", "Build", Arc::new(handler));
        let recorder = Recorder {
            events: events.clone(),
            fail_on,
        };
        let temp = tempfile::tempdir().unwrap();
        let ctx = context(
            temp.path(),
            "build",
            serde_json::json!({}),
            Arc::new(RecordingRunner::default()),
        );
        (definition, recorder, events, ctx, temp)
    }

    fn events(events: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        events.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_successful_run_visits_every_hook_in_order() {
        let (definition, recorder, log, ctx, _temp) = setup(false, None);

        let outcome = execute_with_hooks(&definition, &ctx, Some(&recorder)).await.unwrap();

        assert_eq!(outcome, CommandOutcome::Succeeded);
        assert_eq!(
            events(&log),
            vec!["before_all", "before_each", "handler", "after_each", "after_all"]
        );
    }

    #[tokio::test]
    async fn test_failing_handler_runs_on_error_then_after_hooks_once() {
        let (definition, recorder, log, ctx, _temp) = setup(true, None);

        let outcome = execute_with_hooks(&definition, &ctx, Some(&recorder)).await.unwrap();

        assert_eq!(outcome, CommandOutcome::Failed);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(
            events(&log),
            vec!["before_all", "before_each", "handler", "on_error", "after_each", "after_all"]
        );
    }

    #[tokio::test]
    async fn test_failing_on_error_still_runs_after_hooks_then_propagates() {
        let (definition, recorder, log, ctx, _temp) = setup(true, Some("on_error"));

        let err = execute_with_hooks(&definition, &ctx, Some(&recorder))
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("on_error failed"));
        assert_eq!(
            events(&log),
            vec!["before_all", "before_each", "handler", "on_error", "after_each", "after_all"]
        );
    }

    #[tokio::test]
    async fn test_before_hook_failure_aborts_and_skips_on_error() {
        let (definition, recorder, log, ctx, _temp) = setup(false, Some("before_each"));

        let err = execute_with_hooks(&definition, &ctx, Some(&recorder))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "before_each failed");
        assert_eq!(events(&log), vec!["before_all", "before_each"]);
    }

    #[tokio::test]
    async fn test_no_hooks() {
        let (definition, _recorder, log, ctx, _temp) = setup(true, None);

        let outcome = execute_with_hooks(&definition, &ctx, None).await.unwrap();

        assert_eq!(outcome, CommandOutcome::Failed);
        assert_eq!(events(&log), vec!["handler"]);
    }
}
