// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{GrainflowError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::GrainflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_table(cfg)?;
    validate_realtime(cfg)?;
    validate_board(cfg)?;
    validate_ants(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> GrainflowError {
    GrainflowError::ConfigError(msg.into())
}

fn validate_table(cfg: &RawConfigFile) -> Result<()> {
    if cfg.table.capacity == 0 {
        return Err(config_error("[table].capacity must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_realtime(cfg: &RawConfigFile) -> Result<()> {
    let rt = &cfg.realtime;
    if rt.tick_ms == 0 {
        return Err(config_error("[realtime].tick_ms must be >= 1 (got 0)"));
    }
    if rt.max_ticks == 0 {
        return Err(config_error("[realtime].max_ticks must be >= 1 (got 0)"));
    }
    if !rt.repo_pos.is_finite() {
        return Err(config_error(format!(
            "[realtime].repo_pos must be finite (got {})",
            rt.repo_pos
        )));
    }
    Ok(())
}

fn validate_board(cfg: &RawConfigFile) -> Result<()> {
    let b = &cfg.board;
    if !b.origin.is_finite() || !b.dx.is_finite() || !b.dy.is_finite() {
        return Err(config_error(format!(
            "[board] origin/dx/dy must be finite (got origin {}, dx {}, dy {})",
            b.origin, b.dx, b.dy
        )));
    }
    Ok(())
}

fn validate_ants(cfg: &RawConfigFile) -> Result<()> {
    if cfg.ants.is_empty() {
        return Err(config_error(
            "config must contain at least one [[ant]] entry",
        ));
    }

    let mut seen = HashSet::new();
    for ant in &cfg.ants {
        if !seen.insert(ant.id.as_str()) {
            return Err(config_error(format!("duplicate ant id '{}'", ant.id)));
        }
        if !(ant.speed.is_finite() && ant.speed > 0.0) {
            return Err(config_error(format!(
                "ant '{}' speed must be finite and > 0 (got {})",
                ant.id, ant.speed
            )));
        }
        if !ant.pos.is_finite() {
            return Err(config_error(format!(
                "ant '{}' position must be finite (got {})",
                ant.id, ant.pos
            )));
        }
    }
    Ok(())
}
