//! Test-definition documents consumed by the suite runner.
//!
//! Three documents are produced: one test set per category, a `TestSuite.xml`
//! per suite listing its test sets, and the shared `Envs/TestEnv.xml`.

use crate::Result;
use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension of every generated document.
pub const DOCUMENT_EXTENSION: &str = "xml";

/// File name of a suite's test-set index.
pub const TEST_SUITE_FILE: &str = "TestSuite.xml";

/// File name of the test environment.
pub const TEST_ENV_FILE: &str = "TestEnv.xml";

const JAVA_CLASS: &str = "com.simba.testframework.testcases.jdbc.resultvalidation.SqlTester";

/// One generated statement with its sequence ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestQuery {
    pub id: u32,
    pub sql: String,
}

/// A named, ID-sequenced list of statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSetDocument {
    pub name: String,
    pub queries: Vec<TestQuery>,
}

impl TestSetDocument {
    /// Numbers `queries` consecutively from `starting_id`.
    pub fn new(name: impl Into<String>, starting_id: u32, queries: Vec<String>) -> Self {
        let queries = (starting_id..)
            .zip(queries)
            .map(|(id, sql)| TestQuery { id, sql })
            .collect();
        Self {
            name: name.into(),
            queries,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{DOCUMENT_EXTENSION}", self.name)
    }

    pub fn to_xml(&self) -> String {
        let mut xml = format!(
            "<TestSet Name=\"{}\" JavaClass=\"{JAVA_CLASS}\" dotNetClass=\"SqlTester\">\n",
            escape(self.name.as_str())
        );
        for query in &self.queries {
            let _ = writeln!(
                xml,
                "\t<Test Name=\"SQL_QUERY\" JavaMethod=\"testSqlQuery\" dotNetMethod=\"TestSqlQuery\" ID=\"{}\">",
                query.id
            );
            let _ = writeln!(xml, "\t\t<SQL><![CDATA[{}]]></SQL>", cdata(&query.sql));
            xml.push_str("\t\t<ValidateColumns>True</ValidateColumns>\n");
            xml.push_str("\t\t<ValidateNumericExactly>True</ValidateNumericExactly>\n");
            xml.push_str("\t</Test>\n");
        }
        xml.push_str("</TestSet>");
        xml
    }

    /// Writes the document into `dir`, replacing any previous version.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        fs::write(&path, self.to_xml())?;
        debug!(path = %path.display(), queries = self.queries.len(), "wrote test set");
        Ok(path)
    }
}

/// Splits any `]]>` so the text survives inside a CDATA section.
fn cdata(text: &str) -> String {
    text.replace("]]>", "]]]]><![CDATA[>")
}

/// Renders a suite's `TestSuite.xml`.
pub fn test_suite_xml<S: AsRef<str>>(suite: &str, test_sets: &[S]) -> String {
    let suite = escape(suite);
    let mut xml = String::from("<TestSuite Name=\"SQL Test\">\n");
    for test_set in test_sets {
        let test_set = escape(test_set.as_ref());
        let _ = writeln!(
            xml,
            "\t<TestSet Name=\"{test_set}\" SetFile=\"{suite}/TestSets/{test_set}.{DOCUMENT_EXTENSION}\">"
        );
        xml.push_str("\t\t<!--\n");
        xml.push_str("\t\t<Exclusion StartID=\"6\" EndID=\"6\">Exclusion reason</Exclusion>\n");
        xml.push_str("\t\t<Ignorable StartID=\"6\" EndID=\"6\">Ignorable reason</Ignorable>\n");
        xml.push_str("\t\t-->\n");
        xml.push_str("\t</TestSet>\n");
    }
    xml.push_str("\t<GenerateResults>true</GenerateResults>\n");
    let _ = writeln!(xml, "\t<BaselineDirectory>{suite}\\ResultSets</BaselineDirectory>");
    xml.push_str("</TestSuite>");
    xml
}

/// Renders the shared `TestEnv.xml`.
pub fn test_env_xml(connection_string: &str) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<TestEnvironment>\n");
    let _ = writeln!(
        xml,
        "\t<ConnectionString>{}</ConnectionString>",
        escape(connection_string)
    );
    xml.push_str("\t<_Monitor>\n");
    xml.push_str("\t\t<GenerateResults>true</GenerateResults>\n");
    xml.push_str("\t\t<timeout>20</timeout>\n");
    xml.push_str("\t\t<maxConsecutiveTimeout>15</maxConsecutiveTimeout>\n");
    xml.push_str("\t\t<maxAccumulatedTimeout>50</maxAccumulatedTimeout>\n");
    xml.push_str("\t</_Monitor>\n");
    xml.push_str("\t<SqlWcharEncoding>UTF-32</SqlWcharEncoding>\n");
    xml.push_str("</TestEnvironment>");
    xml
}
