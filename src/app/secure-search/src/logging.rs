// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use internal_error::InternalError;
use tracing_subscriber::EnvFilter;

use crate::{LogFormat, LoggingConfig};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over the configured level. Does nothing when
/// a subscriber is already installed, which is the case under tests.
pub fn configure_logging(config: &LoggingConfig) -> Result<(), InternalError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(InternalError::new)?;

    // Redirect records of the `log` crate used by some dependencies. Fails
    // when the subscriber has already installed the redirect itself.
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!(error = %e, "Log records are already redirected");
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
