// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box specs for the `sb` binary.
//!
//! The files under `cli/` are built as test targets of the `syllabus`
//! package so that `assert_cmd` can locate the binary; this crate only
//! groups them in the workspace.
