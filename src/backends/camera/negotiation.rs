// SPDX-License-Identifier: GPL-3.0-only

//! Tier-by-tier stream negotiation
//!
//! Walks [`QualityTier::FALLBACK_ORDER`] once per negotiation. Each tier is
//! requested exactly once; a rejection moves to the next tier unless it is a
//! permission refusal, which ends negotiation immediately.

use super::types::{AcquireError, FacingMode, StreamConstraints};
use super::{CaptureDeviceProvider, MediaStream, stop_tracks};
use crate::constants::QualityTier;
use crate::errors::CameraError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A stream acquired at a specific tier
#[derive(Clone)]
pub struct NegotiatedStream {
    pub tier: QualityTier,
    pub constraints: StreamConstraints,
    pub stream: Arc<dyn MediaStream>,
}

impl std::fmt::Debug for NegotiatedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NegotiatedStream")
            .field("tier", &self.tier)
            .field("stream", &self.stream.id())
            .finish()
    }
}

/// Why negotiation ended without a stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    /// A tier was refused for lack of permission
    #[error("permission refused: {0}")]
    PermissionRefused(String),
    /// Every tier was rejected; carries the last rejection's message
    #[error("all quality tiers rejected: {last_error}")]
    Exhausted { last_error: String },
    /// The session moved on while a request was in flight
    #[error("negotiation superseded")]
    Superseded,
}

impl NegotiationError {
    /// Map to the session-facing error, `None` for a superseded attempt
    pub fn into_camera_error(self) -> Option<CameraError> {
        match self {
            NegotiationError::PermissionRefused(msg) => Some(CameraError::PermissionRefused(msg)),
            NegotiationError::Exhausted { last_error } => {
                Some(CameraError::DeviceUnavailable(last_error))
            }
            NegotiationError::Superseded => None,
        }
    }
}

/// Requests streams from a provider following the tier fallback order
pub struct TierNegotiator<'a> {
    provider: &'a dyn CaptureDeviceProvider,
}

impl<'a> TierNegotiator<'a> {
    pub fn new(provider: &'a dyn CaptureDeviceProvider) -> Self {
        Self { provider }
    }

    /// Negotiate a stream for `facing`.
    ///
    /// `still_current` is checked before every request and after every
    /// response. Once it returns false, no further tier is requested and a
    /// stream that arrives late is stopped instead of returned.
    ///
    /// `on_reject` is told about every rejected tier.
    ///
    /// Any non-permission rejection falls through to the next tier, whether
    /// the device reported unsatisfiable constraints or some other failure.
    pub async fn negotiate<C, R>(
        &self,
        facing: FacingMode,
        still_current: C,
        mut on_reject: R,
    ) -> Result<NegotiatedStream, NegotiationError>
    where
        C: Fn() -> bool,
        R: FnMut(QualityTier, &AcquireError),
    {
        let mut last_error = String::from("no quality tier attempted");

        for tier in QualityTier::FALLBACK_ORDER {
            if !still_current() {
                return Err(NegotiationError::Superseded);
            }

            let constraints = StreamConstraints::for_tier(tier, facing);
            info!(tier = %tier, facing = %facing, "Requesting camera stream");
            debug!(?constraints, "Stream constraints");

            let result = self.provider.request_stream(&constraints).await;

            if !still_current() {
                if let Ok(stream) = result {
                    let stopped = stop_tracks(stream.as_ref());
                    info!(
                        stream = stream.id(),
                        stopped, "Discarding stream from superseded negotiation"
                    );
                }
                return Err(NegotiationError::Superseded);
            }

            match result {
                Ok(stream) => {
                    info!(tier = %tier, stream = stream.id(), "Camera stream acquired");
                    return Ok(NegotiatedStream {
                        tier,
                        constraints,
                        stream,
                    });
                }
                Err(err) if err.is_permission_refusal() => {
                    warn!(tier = %tier, error = %err, "Camera permission refused");
                    on_reject(tier, &err);
                    return Err(NegotiationError::PermissionRefused(err.message().to_string()));
                }
                Err(err) => {
                    match &err {
                        AcquireError::Unsatisfiable(_) => {
                            info!(tier = %tier, error = %err, "Tier not supported, falling back")
                        }
                        _ => {
                            warn!(tier = %tier, error = %err, "Tier failed with a device error, falling back")
                        }
                    }
                    on_reject(tier, &err);
                    last_error = err.message().to_string();
                }
            }
        }

        Err(NegotiationError::Exhausted { last_error })
    }
}
