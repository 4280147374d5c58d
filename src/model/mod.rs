//! Classifier implementations
//!
//! All models consume an `Array2<f64>` feature matrix and an `Array1<i64>`
//! label vector of class indices, and predict class indices back.

mod adaboost;
mod balanced_forest;
mod decision_tree;
mod easy_ensemble;
mod logistic;

pub use adaboost::AdaBoostClassifier;
pub use balanced_forest::{BalancedRandomForest, MaxFeaturesRule};
pub use decision_tree::DecisionTree;
pub use easy_ensemble::EasyEnsemble;
pub use logistic::LogisticRegression;
