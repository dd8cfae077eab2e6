//! Integration tests for Tidetube
//!
//! Exercise the library, artifact pipeline and serializer together against
//! real temporary storage directories.

#[path = "integration/common.rs"]
mod common;

#[path = "integration/artifact_lifecycle.rs"]
mod artifact_lifecycle;
#[path = "integration/failure_policies.rs"]
mod failure_policies;
#[path = "integration/federation_roundtrip.rs"]
mod federation_roundtrip;
#[path = "integration/ffmpeg_tools.rs"]
mod ffmpeg_tools;
#[path = "integration/json_store.rs"]
mod json_store;
