//! shopsight - Imbalanced-classification experiment service
//!
//! Compares three strategies for predicting whether an online shopping
//! session ends in a purchase, over a dataset where purchases are the rare
//! class:
//!
//! - SMOTE oversampling + logistic regression
//! - balanced random forest
//! - easy-ensemble boosting
//!
//! The dataset is loaded, one-hot encoded and split once; every experiment
//! is a pure function of that split and a [`experiment::Strategy`], so runs
//! with different configurations stay comparable.
//!
//! # Modules
//!
//! - [`data`] - Dataset loading, one-hot encoding, train/test split
//! - [`resample`] - SMOTE oversampling and random undersampling
//! - [`model`] - Classifier implementations
//! - [`experiment`] - Strategy dispatch and report assembly
//! - [`report`] - Scoring, classification report, confusion/correlation
//! - [`cli`] - Command-line interface
//! - [`server`] - HTTP API

pub mod cli;
pub mod data;
pub mod error;
pub mod experiment;
pub mod model;
pub mod report;
pub mod resample;
pub mod server;

pub use error::{Result, ShopsightError};
