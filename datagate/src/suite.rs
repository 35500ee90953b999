//! Expectation suites: named, ordered collections of rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::expectations::Rule;

/// A named, ordered collection of expectations.
///
/// Ordering is irrelevant to evaluation but insertion order is preserved for
/// reporting. An expectation's identity is its rule name plus target column;
/// re-adding the same identity replaces the earlier entry in place.
///
/// The suite is its own persisted record: it round-trips through the config
/// store unchanged.
///
/// # Examples
///
/// ```rust
/// use datagate::expectations::Rule;
/// use datagate::suite::ExpectationSuite;
///
/// let suite = ExpectationSuite::builder("orders_expectations")
///     .expect(Rule::NotNull { column: "order_id".into() })
///     .expect(Rule::RowCountBetween { min: 1, max: 1_000_000 })
///     .build();
///
/// assert_eq!(suite.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationSuite {
    name: String,
    expectations: Vec<Rule>,
}

impl ExpectationSuite {
    /// Creates a builder for a suite with the given name.
    pub fn builder(name: impl Into<String>) -> ExpectationSuiteBuilder {
        ExpectationSuiteBuilder::new(name)
    }

    /// Returns the suite's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the expectations in insertion order.
    pub fn expectations(&self) -> &[Rule] {
        &self.expectations
    }

    /// Returns the number of expectations.
    pub fn len(&self) -> usize {
        self.expectations.len()
    }

    /// Returns true when the suite holds no expectations.
    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }

    /// Appends an expectation, replacing an existing one with the same rule
    /// name and target column in place.
    pub fn add_expectation(&mut self, rule: Rule) {
        let identity = (rule.name(), rule.column().map(str::to_string));
        if let Some(existing) = self
            .expectations
            .iter_mut()
            .find(|r| (r.name(), r.column().map(str::to_string)) == identity)
        {
            *existing = rule;
        } else {
            self.expectations.push(rule);
        }
    }
}

/// Builder for [`ExpectationSuite`] supporting the declarative authoring
/// path: typed rules directly, or rule name plus parameters.
#[derive(Debug)]
pub struct ExpectationSuiteBuilder {
    suite: ExpectationSuite,
}

impl ExpectationSuiteBuilder {
    /// Creates a new suite builder with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            suite: ExpectationSuite {
                name: name.into(),
                expectations: Vec::new(),
            },
        }
    }

    /// Adds a typed rule.
    pub fn expect(mut self, rule: Rule) -> Self {
        self.suite.add_expectation(rule);
        self
    }

    /// Adds a rule by its wire name and parameter object.
    ///
    /// # Errors
    ///
    /// Fails with [`GateError::UnknownRule`](crate::error::GateError) before
    /// any batch is fetched when the name is not in the catalog.
    pub fn expectation(mut self, name: &str, params: Value) -> Result<Self> {
        let rule = Rule::from_config(name, params)?;
        rule.validate()?;
        self.suite.add_expectation(rule);
        Ok(self)
    }

    /// Builds the suite.
    pub fn build(self) -> ExpectationSuite {
        self.suite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GateError;
    use serde_json::json;

    #[test]
    fn test_builder_preserves_insertion_order() {
        let suite = ExpectationSuite::builder("orders")
            .expect(Rule::NotNull {
                column: "b".to_string(),
            })
            .expect(Rule::NotNull {
                column: "a".to_string(),
            })
            .build();

        let columns: Vec<_> = suite
            .expectations()
            .iter()
            .filter_map(|r| r.column())
            .collect();
        assert_eq!(columns, vec!["b", "a"]);
    }

    #[test]
    fn test_same_identity_replaces_in_place() {
        let mut suite = ExpectationSuite::builder("orders")
            .expect(Rule::ValuesBetween {
                column: "amount".to_string(),
                min: 0.0,
                max: 10.0,
            })
            .expect(Rule::NotNull {
                column: "amount".to_string(),
            })
            .build();

        suite.add_expectation(Rule::ValuesBetween {
            column: "amount".to_string(),
            min: 0.0,
            max: 99.0,
        });

        assert_eq!(suite.len(), 2);
        match &suite.expectations()[0] {
            Rule::ValuesBetween { max, .. } => assert_eq!(*max, 99.0),
            other => panic!("unexpected rule: {other:?}"),
        }
    }

    #[test]
    fn test_by_name_authoring_converges_with_typed() {
        let typed = ExpectationSuite::builder("s")
            .expect(Rule::NotNull {
                column: "anio".to_string(),
            })
            .build();
        let by_name = ExpectationSuite::builder("s")
            .expectation(
                "expect_column_values_to_not_be_null",
                json!({"column": "anio"}),
            )
            .unwrap()
            .build();

        assert_eq!(typed, by_name);
    }

    #[test]
    fn test_unknown_rule_rejected_at_build_time() {
        let err = ExpectationSuite::builder("s")
            .expectation("not_a_real_rule", json!({"column": "anio"}))
            .unwrap_err();
        assert!(matches!(err, GateError::UnknownRule(_)));
    }

    #[test]
    fn test_suite_roundtrip() {
        let suite = ExpectationSuite::builder("orders")
            .expect(Rule::NotNull {
                column: "order_id".to_string(),
            })
            .build();

        let json = serde_json::to_string(&suite).unwrap();
        let parsed: ExpectationSuite = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, suite);
    }
}
