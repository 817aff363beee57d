// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! systemd unit reconciliation for Resticara.
//!
//! Every job owns four unit files: a backup service and timer, and a prune
//! service and timer. [`UnitReconciler`] computes that set from the job list,
//! removes units for jobs that no longer exist, rewrites the rest and
//! (re)activates the timers through a [`ServiceManager`].

pub mod error;
pub mod manager;
pub mod reconcile;
pub mod systemctl;
pub mod unit;

pub use error::{Result, SystemdError};
pub use manager::ServiceManager;
pub use reconcile::{
	ReconcileOutcome, ReconcileSettings, ReconciliationPlan, UnitFailure, UnitReconciler,
	PREFERRED_UNIT_DIR,
};
pub use systemctl::SystemctlClient;
pub use unit::{sanitize_name, UnitDescriptor, UnitFile, UNIT_PREFIX};
