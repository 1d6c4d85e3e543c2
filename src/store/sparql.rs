//! SPARQL query parsing and evaluation over a committed snapshot.

use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use oxrdf::{vocab::xsd, Dataset, Graph, Term};
use serde_json::{json, Map, Value};
use spareval::{CancellationToken, QueryEvaluator, QueryResults};
use spargebra::{Query, SparqlParser};

use super::StoreError;

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// The four SPARQL query forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryForm {
    Select,
    Ask,
    Construct,
    Describe,
}

impl QueryForm {
    fn of(query: &Query) -> Self {
        match query {
            Query::Select { .. } => Self::Select,
            Query::Ask { .. } => Self::Ask,
            Query::Construct { .. } => Self::Construct,
            Query::Describe { .. } => Self::Describe,
        }
    }
}

/// A syntactically valid query, parsed before any transaction is opened.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    query: Query,
    form: QueryForm,
}

impl PreparedQuery {
    /// # Errors
    ///
    /// Returns [`StoreError::Syntax`] when `text` is not a SPARQL query.
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        let query = SparqlParser::new()
            .parse_query(text)
            .map_err(|e| StoreError::Syntax(e.to_string()))?;
        let form = QueryForm::of(&query);
        Ok(Self { query, form })
    }

    #[must_use]
    pub const fn form(&self) -> QueryForm {
        self.form
    }

    /// Evaluates against `dataset` and materialises every result. Evaluation
    /// is cancelled once `timeout` has elapsed and reports
    /// [`StoreError::Timeout`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Evaluation`] or [`StoreError::Timeout`].
    pub fn execute(&self, dataset: &Dataset, timeout: Duration) -> Result<QueryOutcome, StoreError> {
        let deadline = Deadline::start(timeout);
        let results = QueryEvaluator::new()
            .with_cancellation_token(deadline.token.clone())
            .prepare(&self.query)
            .execute(dataset)
            .map_err(|e| deadline.failed(&e))?;
        deadline.check()?;

        match results {
            QueryResults::Boolean(value) => Ok(QueryOutcome::Boolean(value)),
            QueryResults::Solutions(solutions) => {
                let variables: Vec<String> = solutions
                    .variables()
                    .iter()
                    .map(|v| v.as_str().to_string())
                    .collect();
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| deadline.failed(&e))?;
                    deadline.check()?;
                    rows.push(
                        solution
                            .iter()
                            .map(|(variable, term)| (variable.as_str().to_string(), term.clone()))
                            .collect(),
                    );
                }
                Ok(QueryOutcome::Solutions(SolutionTable { variables, rows }))
            }
            QueryResults::Graph(triples) => {
                let mut graph = Graph::new();
                for triple in triples {
                    let triple = triple.map_err(|e| deadline.failed(&e))?;
                    deadline.check()?;
                    graph.insert(&triple);
                }
                Ok(QueryOutcome::Graph(graph))
            }
        }
    }
}

/// Time budget of one evaluation. A watchdog thread cancels `token` when the
/// budget runs out; dropping the deadline stops the watchdog.
struct Deadline {
    started: Instant,
    budget: Duration,
    token: CancellationToken,
    _finished: Option<mpsc::Sender<()>>,
}

impl Deadline {
    fn start(budget: Duration) -> Self {
        let token = CancellationToken::new();
        let (finished, done) = mpsc::channel::<()>();
        let watched = token.clone();
        let watchdog = thread::Builder::new()
            .name("sparql-deadline".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = done.recv_timeout(budget) {
                    watched.cancel();
                }
            });
        let finished = match watchdog {
            Ok(_) => Some(finished),
            Err(err) => {
                tracing::warn!(err.msg = %err, "sparql_deadline_watchdog_unavailable");
                None
            }
        };
        Self {
            started: Instant::now(),
            budget,
            token,
            _finished: finished,
        }
    }

    fn expired(&self) -> bool {
        self.started.elapsed() >= self.budget
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.expired() {
            Err(StoreError::Timeout(self.budget))
        } else {
            Ok(())
        }
    }

    /// Evaluation errors after the budget ran out are cancellations.
    fn failed(&self, err: &impl std::fmt::Display) -> StoreError {
        if self.expired() {
            StoreError::Timeout(self.budget)
        } else {
            StoreError::Evaluation(err.to_string())
        }
    }
}

/// Fully materialised query results.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Solutions(SolutionTable),
    Boolean(bool),
    Graph(Graph),
}

/// SELECT results: projected variables plus the bound values of each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionTable {
    variables: Vec<String>,
    rows: Vec<Vec<(String, Term)>>,
}

impl SolutionTable {
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// SPARQL 1.1 Query Results JSON document.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let bindings: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let binding: Map<String, Value> = row
                    .iter()
                    .map(|(variable, term)| (variable.clone(), term_to_json(term)))
                    .collect();
                Value::Object(binding)
            })
            .collect();
        json!({
            "head": { "vars": self.variables },
            "results": { "bindings": bindings },
        })
    }
}

fn term_to_json(term: &Term) -> Value {
    match term {
        Term::NamedNode(node) => json!({ "type": "uri", "value": node.as_str() }),
        Term::BlankNode(node) => json!({ "type": "bnode", "value": node.as_str() }),
        Term::Literal(literal) => {
            let mut value = json!({ "type": "literal", "value": literal.value() });
            if let Some(language) = literal.language() {
                value["xml:lang"] = json!(language);
            } else if literal.datatype() != xsd::STRING {
                value["datatype"] = json!(literal.datatype().as_str());
            }
            value
        }
        #[allow(unreachable_patterns)]
        other => json!({ "type": "triple", "value": other.to_string() }),
    }
}
