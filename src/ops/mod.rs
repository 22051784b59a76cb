//! Operation entry points.
//!
//! One call per requested operation: seed the input bus, assemble the step
//! sequence, run the pipeline, log the outcome and emit the status code on
//! the result channel. The caller decides process lifetime from the
//! returned outcome; nothing here exits the process.

use std::io::Write;
use std::path::Path;

use tracing::{error, info};

use crate::bus::{node, ParameterBus, Value};
use crate::config::Config;
use crate::error::Result;
use crate::management;
use crate::workflow::executor::Pipeline;
use crate::workflow::{assembler, OperationContext, OperationKind};

/// What an operation request carries beyond its kind and server.
#[derive(Debug, Default)]
pub struct OperationRequest<'a> {
    /// Backup identifier: `newest`, `oldest`, or an explicit label.
    /// Required for restore and archive.
    pub identifier: Option<&'a str>,
    /// Target directory for restore and archive output.
    pub directory: Option<&'a Path>,
}

/// Run one operation to completion and write its status code to `channel`.
///
/// Returns whether the operation succeeded. Errors are returned only for
/// failures outside the pipeline itself (unknown server, unwritable
/// channel); a pipeline failure is reported through the status code and the
/// `false` return, with diagnostics logged.
pub fn run(
    config: &Config,
    kind: OperationKind,
    server_name: &str,
    request: &OperationRequest,
    channel: &mut dyn Write,
) -> Result<bool> {
    let server = config.find_server(server_name)?;

    // Advisory identity surface for the hosting environment.
    info!("{}", management::operation_label(kind, &server.name));

    let ctx = OperationContext {
        server,
        base_dir: &config.global.base_dir,
        label: chrono::Local::now().format("%Y%m%d%H%M%S").to_string(),
    };

    let mut input = ParameterBus::new();
    input.append(node::SERVER, Value::String(server.name.clone()))?;
    input.append(node::LABEL, Value::String(ctx.label.clone()))?;
    if let Some(identifier) = request.identifier {
        input.append(node::IDENTIFIER, Value::String(identifier.to_owned()))?;
    }
    if let Some(directory) = request.directory {
        input.append(node::DIRECTORY, Value::Path(directory.to_owned()))?;
    }
    let mut output = ParameterBus::new();

    let mut pipeline = Pipeline::new(assembler::assemble(kind, server));
    let report = pipeline.run(&ctx, &input, &mut output);

    if report.succeeded() {
        let label = output.get_str(node::LABEL).unwrap_or(ctx.label.as_str());
        info!(
            "{}: {}/{} (Elapsed: {})",
            kind,
            server.name,
            label,
            report.elapsed_display()
        );
    } else if let Some(failure) = &report.failure {
        error!("{kind} failed for {}: {failure}", server.name);
    }

    management::write_result(&mut *channel, report.succeeded())?;
    Ok(report.succeeded())
}
