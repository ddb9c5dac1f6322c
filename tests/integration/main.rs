//! Integration tests for Catalog-Harvest
//!
//! These tests run the harvest pipeline against mock directory sites served
//! by wiremock.

mod fetcher_tests;
mod harvest_tests;
