//! arXiv query API client

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::time::Duration;

use super::DocumentSource;
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::types::Paper;

/// Fetches paper metadata from the arXiv Atom API
pub struct ArxivSource {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivSource {
    /// Create a source from configuration
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::source(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.arxiv_url.clone(),
        })
    }
}

#[async_trait]
impl DocumentSource for ArxivSource {
    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Paper>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid("search query is empty"));
        }
        if max_results == 0 {
            return Err(Error::invalid("max_results must be positive"));
        }

        tracing::info!("Searching arXiv for \"{}\" (max {})", query, max_results);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("search_query", format!("all:{}", query)),
                ("start", "0".to_string()),
                ("max_results", max_results.to_string()),
                ("sortBy", "relevance".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::source(format!("arXiv request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::source(format!("arXiv returned {}", status)));
        }

        let body = response.text().await?;
        let papers = parse_atom_feed(&body)?;

        tracing::info!("Fetched {} papers from arXiv", papers.len());
        Ok(papers)
    }

    fn name(&self) -> &str {
        "arxiv"
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Summary,
    Published,
    Id,
    AuthorName,
}

#[derive(Default)]
struct EntryBuilder {
    title: String,
    summary: String,
    published: String,
    id: String,
    author_name: String,
    pdf_url: Option<String>,
    authors: Vec<String>,
}

impl EntryBuilder {
    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Published => &mut self.published,
            Field::Id => &mut self.id,
            Field::AuthorName => &mut self.author_name,
        }
    }

    fn close_author_name(&mut self) {
        let name = collapse_whitespace(&self.author_name);
        if !name.is_empty() {
            self.authors.push(name);
        }
        self.author_name.clear();
    }

    fn finish(self) -> Paper {
        let published = DateTime::parse_from_rfc3339(self.published.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc));

        Paper {
            title: collapse_whitespace(&self.title),
            authors: self.authors,
            summary: collapse_whitespace(&self.summary),
            published,
            source_url: self.pdf_url.unwrap_or_else(|| self.id.trim().to_string()),
        }
    }
}

/// Parse an arXiv Atom feed into papers, in feed order
///
/// Feed-level elements are ignored; only `<entry>` children are read.
pub fn parse_atom_feed(xml: &str) -> Result<Vec<Paper>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut papers = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut in_author = false;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"entry" {
                    entry = Some(EntryBuilder::default());
                    continue;
                }
                let Some(current) = entry.as_mut() else {
                    continue;
                };
                match e.local_name().as_ref() {
                    b"author" => in_author = true,
                    b"name" if in_author => field = Some(Field::AuthorName),
                    b"title" => field = Some(Field::Title),
                    b"summary" => field = Some(Field::Summary),
                    b"published" => field = Some(Field::Published),
                    b"id" => field = Some(Field::Id),
                    b"link" => read_pdf_link(&e, current)?,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(current) = entry.as_mut() {
                    if e.local_name().as_ref() == b"link" {
                        read_pdf_link(&e, current)?;
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let (Some(f), Some(current)) = (field, entry.as_mut()) {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::source(format!("Malformed feed text: {}", e)))?;
                    let target = current.field_mut(f);
                    if !target.is_empty() {
                        target.push(' ');
                    }
                    target.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(done) = entry.take() {
                        papers.push(done.finish());
                    }
                    field = None;
                    in_author = false;
                }
                b"author" => in_author = false,
                b"name" => {
                    if let (Some(Field::AuthorName), Some(current)) = (field, entry.as_mut()) {
                        current.close_author_name();
                    }
                    field = None;
                }
                b"title" | b"summary" | b"published" | b"id" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::source(format!(
                    "Malformed arXiv feed at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(papers)
}

fn read_pdf_link(e: &BytesStart<'_>, entry: &mut EntryBuilder) -> Result<()> {
    let mut is_pdf = false;
    let mut href = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::source(format!("Malformed link attribute: {}", e)))?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::source(format!("Malformed link attribute: {}", e)))?;
        match attr.key.local_name().as_ref() {
            b"title" if value == "pdf" => is_pdf = true,
            b"href" => href = Some(value.into_owned()),
            _ => {}
        }
    }

    if is_pdf {
        entry.pdf_url = href;
    }
    Ok(())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:graph</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/2301.00001v1</id>
    <published>2023-01-02T18:00:00Z</published>
    <title>Graph Neural Networks
      for Molecules</title>
    <summary>  We apply GNNs to drug discovery &amp; property
  prediction.
    </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <link href="http://arxiv.org/abs/2301.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2301.00001v1" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2302.00002v2</id>
    <published>not a date</published>
    <title>Evaluating Summaries</title>
    <summary>BLEU and ROUGE evaluate NLP models.</summary>
    <author><name>Grace Hopper</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_entries_in_order() {
        let papers = parse_atom_feed(FEED).unwrap();
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.title, "Graph Neural Networks for Molecules");
        assert_eq!(
            first.summary,
            "We apply GNNs to drug discovery & property prediction."
        );
        assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(first.source_url, "http://arxiv.org/pdf/2301.00001v1");
        assert_eq!(first.published.map(|p| p.year()), Some(2023));
    }

    #[test]
    fn test_missing_pdf_link_and_bad_date() {
        let papers = parse_atom_feed(FEED).unwrap();
        let second = &papers[1];

        assert_eq!(second.source_url, "http://arxiv.org/abs/2302.00002v2");
        assert!(second.published.is_none());
        assert_eq!(second.authors, vec!["Grace Hopper"]);
    }

    #[test]
    fn test_feed_without_entries() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(parse_atom_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_feed() {
        let xml = "<feed><entry><title>x</summary></entry></feed>";
        assert!(matches!(parse_atom_feed(xml), Err(Error::Source(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_arguments() {
        let source = ArxivSource::new(&SourceConfig::default()).unwrap();
        assert!(matches!(
            source.fetch("graphs", 0).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            source.fetch("   ", 5).await,
            Err(Error::InvalidArgument(_))
        ));
    }
}
