//! Primary-domain classification.
//!
//! The rule list is ordered data: the first rule whose pattern is contained in
//! the raw domain string decides the label. Matching is case-sensitive
//! substring containment, so `"Language,Vision"` is `Language` and
//! `"language"` matches nothing.

use modelcharts_shared::{ModelChartsError, OTHER_DOMAIN, Result, RuleConfig};

/// One `(substring, label)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRule {
    pub pattern: String,
    pub label: String,
}

/// Ordered, validated classification rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRules {
    rules: Vec<DomainRule>,
}

impl DomainRules {
    /// Build a rule list, rejecting a pattern that is mapped to two labels.
    pub fn new(rules: Vec<DomainRule>) -> Result<Self> {
        for (i, rule) in rules.iter().enumerate() {
            if let Some(earlier) = rules[..i]
                .iter()
                .find(|r| r.pattern == rule.pattern && r.label != rule.label)
            {
                return Err(ModelChartsError::ClassificationAmbiguity {
                    pattern: rule.pattern.clone(),
                    first: earlier.label.clone(),
                    second: rule.label.clone(),
                });
            }
        }
        Ok(Self { rules })
    }

    /// Build from the `[classifier]` config section.
    pub fn from_config(rules: &[RuleConfig]) -> Result<Self> {
        Self::new(
            rules
                .iter()
                .map(|r| DomainRule {
                    pattern: r.pattern.clone(),
                    label: r.label.clone(),
                })
                .collect(),
        )
    }

    /// Map a raw domain string to its primary domain. Total: absent input or
    /// no matching rule yields `"Other"`.
    pub fn classify<'a>(&'a self, raw_domain: Option<&str>) -> &'a str {
        let Some(raw) = raw_domain else {
            return OTHER_DOMAIN;
        };
        self.rules
            .iter()
            .find(|rule| raw.contains(rule.pattern.as_str()))
            .map_or(OTHER_DOMAIN, |rule| rule.label.as_str())
    }

    /// Presentation rank of a label: position of its first rule. `Other` and
    /// labels no rule produces sort after every rule label.
    pub fn rank(&self, label: &str) -> usize {
        self.rules
            .iter()
            .position(|rule| rule.label == label)
            .unwrap_or(self.rules.len())
    }

    pub fn rules(&self) -> &[DomainRule] {
        &self.rules
    }
}

impl Default for DomainRules {
    fn default() -> Self {
        let rules = modelcharts_shared::ClassifierConfig::default()
            .rules
            .into_iter()
            .map(|r| DomainRule {
                pattern: r.pattern,
                label: r.label,
            })
            .collect();
        Self { rules }
    }
}
