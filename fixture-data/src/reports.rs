// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fixture reports under `reports/`.

use crate::models::{ReportFixture, TestCaseFixture, TestCaseFixtureStatus};
use iddqd::{IdOrdMap, id_ord_map};
use std::sync::LazyLock;

/// The directory containing the fixture reports.
pub const REPORTS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/reports");

/// The merged run of [`SHARD_1_OF_2`] and [`SHARD_2_OF_2`] spans from the first shard's start to
/// the second shard's end.
pub const MERGED_SHARDS_MILLIS: u64 = 8000;

pub const MODERN: &str = "modern.json";
pub const LEGACY: &str = "legacy.json";
pub const SHARD_1_OF_2: &str = "shard-1-of-2.json";
pub const SHARD_2_OF_2: &str = "shard-2-of-2.json";

pub static EXPECTED_REPORTS: LazyLock<IdOrdMap<ReportFixture>> = LazyLock::new(|| {
    id_ord_map! {
        // Specs with one attempt-holder per project.
        ReportFixture::new(MODERN, include_str!("../reports/modern.json"))
            .with_projects(&["chromium", "firefox"])
            .with_tests([
                TestCaseFixture::new(
                    "cart.spec.ts › cart › adds an item",
                    "chromium",
                    TestCaseFixtureStatus::Passed,
                )
                .at("cart.spec.ts", 4, 7)
                .with_millis(812.0),
                TestCaseFixture::new(
                    "cart.spec.ts › cart › adds an item",
                    "firefox",
                    TestCaseFixtureStatus::Passed,
                )
                .at("cart.spec.ts", 4, 7)
                .with_millis(1034.0),
                TestCaseFixture::new(
                    "cart.spec.ts › cart › applies a coupon",
                    "chromium",
                    TestCaseFixtureStatus::Failed,
                )
                .at("cart.spec.ts", 15, 7)
                .with_retries(1)
                .with_millis(2210.0),
                TestCaseFixture::new(
                    "cart.spec.ts › cart › applies a coupon",
                    "firefox",
                    TestCaseFixtureStatus::Flaky,
                )
                .at("cart.spec.ts", 15, 7)
                .with_retries(1)
                .with_millis(1876.0),
                TestCaseFixture::new(
                    "auth.spec.ts › signs in with SSO",
                    "chromium",
                    TestCaseFixtureStatus::Skipped,
                )
                .at("auth.spec.ts", 8, 5)
                .with_millis(0.0),
                // Recorded as "expected" by the tool, but it needed a retry.
                TestCaseFixture::new(
                    "auth.spec.ts › signs in with SSO",
                    "firefox",
                    TestCaseFixtureStatus::Flaky,
                )
                .at("auth.spec.ts", 8, 5)
                .with_retries(1)
                .with_millis(598.0),
            ]),
        // Legacy test cases, with locations inherited from suites.
        ReportFixture::new(LEGACY, include_str!("../reports/legacy.json"))
            .with_projects(&["webkit"])
            .with_tests([
                TestCaseFixture::new(
                    "search.spec.ts › search › finds products",
                    "webkit",
                    TestCaseFixtureStatus::Passed,
                )
                .at("search.spec.ts", 6, 5)
                .with_millis(455.25),
                TestCaseFixture::new(
                    "search.spec.ts › search › handles an empty query",
                    "webkit",
                    TestCaseFixtureStatus::Failed,
                )
                .at("search.spec.ts", 5, 3)
                .with_retries(2)
                .with_millis(120.0),
                TestCaseFixture::new(
                    "search.spec.ts › loads",
                    "webkit",
                    TestCaseFixtureStatus::Passed,
                )
                .at("search.spec.ts", 1, 1)
                .with_millis(90.0),
            ]),
        ReportFixture::new(SHARD_1_OF_2, include_str!("../reports/shard-1-of-2.json"))
            .with_shard(1, 2)
            .with_projects(&["chromium"])
            .with_tests([
                TestCaseFixture::new("a.spec.ts › first", "chromium", TestCaseFixtureStatus::Passed)
                    .at("a.spec.ts", 3, 0)
                    .with_millis(100.0),
                TestCaseFixture::new("a.spec.ts › second", "chromium", TestCaseFixtureStatus::Failed)
                    .at("a.spec.ts", 9, 0)
                    .with_millis(200.0),
                TestCaseFixture::new("a.spec.ts › third", "chromium", TestCaseFixtureStatus::Passed)
                    .at("a.spec.ts", 15, 0)
                    .with_millis(300.0),
            ]),
        ReportFixture::new(SHARD_2_OF_2, include_str!("../reports/shard-2-of-2.json"))
            .with_shard(2, 2)
            .with_projects(&["chromium"])
            .with_tests([
                TestCaseFixture::new("b.spec.ts › fourth", "chromium", TestCaseFixtureStatus::Flaky)
                    .at("b.spec.ts", 4, 0)
                    .with_retries(1)
                    .with_millis(150.0),
                TestCaseFixture::new("b.spec.ts › fifth", "chromium", TestCaseFixtureStatus::Skipped)
                    .at("b.spec.ts", 12, 0),
            ]),
    }
});
