// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines that run alongside the live preview
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Preview      │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG bytes  │
//! │ Surface      │     │  - Canvas draw    │     │              │
//! │ (RGBA)       │     │  - Mirroring      │     │              │
//! │              │     │  - Encoding       │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Still capture and JPEG encoding

pub mod photo;
