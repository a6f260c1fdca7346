//! Integration tests for components aggregated into models

// Model-level linearity queries
mod model_linearity_tests;

// Evaluation and linear solves over a model
mod evaluation_tests;
