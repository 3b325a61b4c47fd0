// src/orchestrator.rs
// Sequences one logical request over a DriverSession: select the target
// operation, supply coerced arguments, trigger exit, and fold every exit
// path into a single SessionOutcome.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::analyzer::{ContractModel, Operation};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::menu::{build_menu, resolve_index, MenuItem, EXIT_LABEL};
use crate::session::{
    extract_exception, DriverSession, FailureKind, SessionConfig, SessionOutcome,
};
use crate::timeout::{RequestKind, TimeoutGuard};

enum DriveTarget<'a> {
    /// Select the operation and supply its arguments
    Operation {
        operation: &'a Operation,
        args: &'a [String],
    },
    /// Requested name is not in the handler table; still reach the menu and
    /// exit cleanly
    Missing { requested: &'a str },
    /// Observe the menu and exit immediately
    MenuOnly,
}

struct DriveReport {
    exit_code: i32,
    operation_selected: bool,
    warnings: Vec<String>,
}

/// Drives wrapped-process sessions for one analyzed contract.
///
/// The operation handler table is closed at construction time; unknown
/// names take the defined not-found branch instead of dispatching by
/// string into anything live.
pub struct Orchestrator {
    config: EngineConfig,
    model: ContractModel,
    menu: Vec<MenuItem>,
    handlers: HashMap<String, Operation>,
}

impl Orchestrator {
    pub fn new(config: EngineConfig, model: ContractModel) -> Self {
        let menu = build_menu(&model.operations);
        let handlers = model
            .operations
            .iter()
            .map(|op| (op.name.to_ascii_lowercase(), op.clone()))
            .collect();
        Self {
            config,
            model,
            menu,
            handlers,
        }
    }

    pub fn model(&self) -> &ContractModel {
        &self.model
    }

    pub fn menu(&self) -> &[MenuItem] {
        &self.menu
    }

    pub fn lookup(&self, name: &str) -> Option<&Operation> {
        self.handlers.get(&name.to_ascii_lowercase())
    }

    /// Execute one operation end to end.
    ///
    /// Everything after a successful spawn terminates in a `SessionOutcome`;
    /// only spawn failures and invalid caller input abort with an error.
    pub async fn execute(&self, requested: &str, args: &[String]) -> Result<SessionOutcome> {
        let operation = self.lookup(requested);

        let coerced = match operation {
            Some(op) => Some(coerce_arguments(op, args)?),
            None => None,
        };

        let mut session = DriverSession::spawn(SessionConfig::for_execute(&self.config))?;
        info!(session_id = %session.id, operation = requested, "Executing operation");

        let target = match (operation, &coerced) {
            (Some(op), Some(values)) => DriveTarget::Operation {
                operation: op,
                args: values,
            },
            _ => DriveTarget::Missing { requested },
        };

        let guard = TimeoutGuard::for_kind(RequestKind::Execute, &self.config);
        let driven = guard.run(drive(&mut session, target, self.menu.len())).await;

        match driven {
            Ok(report) => Ok(self.assemble(&session, report, true)),
            Err(expired) => Ok(timeout_outcome(&mut session, expired.bound).await),
        }
    }

    /// Start the wrapped program, wait for its menu, and exit immediately.
    /// Surfaces the echoed menu text for discovery.
    pub async fn probe(&self) -> Result<SessionOutcome> {
        let mut session = DriverSession::spawn(SessionConfig::for_execute(&self.config))?;
        info!(session_id = %session.id, "Probing menu");

        let guard = TimeoutGuard::for_kind(RequestKind::Execute, &self.config);
        match guard
            .run(drive(&mut session, DriveTarget::MenuOnly, self.menu.len()))
            .await
        {
            Ok(report) => Ok(self.assemble(&session, report, false)),
            Err(expired) => Ok(timeout_outcome(&mut session, expired.bound).await),
        }
    }

    /// Run the configured compile command to completion. No menu
    /// interaction; the shorter bound applies.
    pub async fn compile(&self) -> Result<SessionOutcome> {
        let program = self
            .config
            .compile_program
            .clone()
            .ok_or_else(|| EngineError::Config("no compile command configured".to_string()))?;

        let mut session = DriverSession::spawn(SessionConfig::for_compile(&self.config, program))?;
        info!(session_id = %session.id, "Compiling");

        let guard = TimeoutGuard::for_kind(RequestKind::Compile, &self.config);
        match guard.run(session.wait_exit()).await {
            Ok(Ok(exit_code)) => {
                let report = DriveReport {
                    exit_code,
                    operation_selected: true,
                    warnings: Vec::new(),
                };
                Ok(self.assemble(&session, report, false))
            }
            Ok(Err(e)) => Ok(fault_outcome(&mut session, e).await),
            Err(expired) => Ok(timeout_outcome(&mut session, expired.bound).await),
        }
    }

    /// Fold captured output, the exception marker, the exit code, and the
    /// selection warnings into the session's single outcome.
    fn assemble(
        &self,
        session: &DriverSession,
        report: DriveReport,
        selection_required: bool,
    ) -> SessionOutcome {
        let captured = session.capture_snapshot();
        let code = report.exit_code;

        let mut outcome = if let Some(exception) = extract_exception(&captured) {
            SessionOutcome::failed(FailureKind::RuntimeException, captured, Some(code))
                .with_error(exception)
        } else if selection_required && !report.operation_selected {
            SessionOutcome::failed(FailureKind::OperationNotFound, captured, Some(code))
        } else if code != 0 {
            SessionOutcome::failed(FailureKind::NonZeroExit, captured, Some(code))
                .with_error(format!("wrapped process exited with code {}", code))
        } else {
            SessionOutcome::succeeded(captured, code)
        };

        for warning in report.warnings {
            warn!(session_id = %session.id, warning = %warning, "Session warning");
            outcome.errors.push(warning);
        }
        let result = extract_result(&outcome.captured_output);
        outcome.with_result(result)
    }
}

/// Drive the scripted interaction: menu latch → selection → parameters →
/// exit → process exit. Write refusals after an exception are collected as
/// warnings; the session still runs to its exit event.
async fn drive(
    session: &mut DriverSession,
    target: DriveTarget<'_>,
    fallback_exit: usize,
) -> DriveReport {
    let mut warnings = Vec::new();
    let mut operation_selected = false;

    match session.wait_for_menu().await {
        Ok(captured) => {
            // The echoed menu is authoritative for index lookup; the model's
            // fixed ordering is the fallback when its exit line cannot be
            // matched.
            let exit_index = resolve_index(&captured, EXIT_LABEL).unwrap_or(fallback_exit);

            let interaction = async {
                match target {
                    DriveTarget::Operation { operation, args } => {
                        match resolve_index(&captured, &operation.name) {
                            Some(index) => {
                                session.select(index).await?;
                                operation_selected = true;
                                for value in args {
                                    session.supply(value).await?;
                                }
                            }
                            None => {
                                warnings.push(format!(
                                    "operation `{}` not found in echoed menu, selecting exit",
                                    operation.name
                                ));
                            }
                        }
                    }
                    DriveTarget::Missing { requested } => {
                        warnings.push(format!(
                            "operation `{}` is not in the handler table, selecting exit",
                            requested
                        ));
                    }
                    DriveTarget::MenuOnly => {
                        operation_selected = true;
                    }
                }
                session.finish(exit_index).await
            };

            if let Err(e) = interaction.await {
                warnings.push(format!("scripted input aborted: {}", e));
            }
        }
        Err(e) => {
            warnings.push(format!("menu prompt never observed: {}", e));
        }
    }

    let exit_code = match session.wait_exit().await {
        Ok(code) => code,
        Err(e) => {
            warnings.push(format!("could not confirm process exit: {}", e));
            -1
        }
    };

    DriveReport {
        exit_code,
        operation_selected,
        warnings,
    }
}

/// Validate and coerce arguments against the operation's declared
/// parameters, in declaration order.
fn coerce_arguments(operation: &Operation, args: &[String]) -> Result<Vec<String>> {
    if args.len() != operation.parameters.len() {
        return Err(EngineError::InvalidInput(format!(
            "operation `{}` expects {} argument(s), got {}",
            operation.name,
            operation.parameters.len(),
            args.len()
        )));
    }
    operation
        .parameters
        .iter()
        .zip(args)
        .map(|(param, raw)| {
            param.type_tag.coerce(raw).map_err(|e| {
                EngineError::InvalidInput(format!("argument `{}`: {}", param.name, e))
            })
        })
        .collect()
}

/// Best-effort discovery of the operation's return value in the captured
/// text. The raw capture is always available alongside.
fn extract_result(captured: &str) -> Option<String> {
    captured.lines().find_map(|line| {
        let (_, value) = line.split_once("Result:")?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

async fn timeout_outcome(session: &mut DriverSession, bound: std::time::Duration) -> SessionOutcome {
    if let Err(e) = session.kill().await {
        warn!(session_id = %session.id, error = %e, "Kill after timeout failed");
    }
    let _ = session.wait_exit().await;
    SessionOutcome::failed(FailureKind::Timeout, session.capture_snapshot(), None).with_error(
        format!("session exceeded its {}ms bound", bound.as_millis()),
    )
}

async fn fault_outcome(session: &mut DriverSession, fault: EngineError) -> SessionOutcome {
    let _ = session.kill().await;
    SessionOutcome::failed(
        FailureKind::NonZeroExit,
        session.capture_snapshot(),
        None,
    )
    .with_error(format!("engine fault while awaiting exit: {}", fault))
}
