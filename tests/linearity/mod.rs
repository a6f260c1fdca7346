//! Integration tests for symbolic linearity classification

// Classifier behaviour on free-standing expressions
mod classifier_tests;

// Hardcoded flags of closed-form components against the classifier
mod closed_form_tests;
