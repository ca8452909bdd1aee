//! CSV and JSON files in and out of the pipeline.
//!
//! | File | Columns |
//! |------|---------|
//! | triples | `year,ego,alter,value` |
//! | membership | `year,country` |
//! | vocabulary | `country` |
//! | scores | `year,ego,alter,<relation>...` |
//! | top | `ego,<year>...` |
//!
//! Communities are written as JSON, keyed by year then resolution step.

use crate::context::{RelationTriple, SystemMembership, TripleTable, Year};
use crate::country::{CountryId, Vocabulary};
use crate::error::Result;
use crate::hegemon::{HegemonyScoreTable, HegemonyTopTable};
use crate::pipeline::CommunityIndex;
use csv::{Reader, Writer};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

#[derive(Deserialize)]
struct MembershipRecord {
    year: Year,
    country: CountryId,
}

#[derive(Deserialize)]
struct VocabularyRecord {
    country: CountryId,
}

/// Read relation triples; repeated keys are summed.
pub fn read_triples_from<R: Read>(reader: R) -> Result<TripleTable> {
    let mut table = TripleTable::new();
    for record in Reader::from_reader(reader).deserialize::<RelationTriple>() {
        table.insert(record?)?;
    }
    Ok(table)
}

/// Read relation triples from a file.
pub fn read_triples(path: impl AsRef<Path>) -> Result<TripleTable> {
    let path = path.as_ref();
    let table = read_triples_from(File::open(path)?)?;
    info!(path = %path.display(), triples = table.len(), "read triples");
    Ok(table)
}

/// Read a system-membership table.
pub fn read_membership_from<R: Read>(reader: R) -> Result<SystemMembership> {
    let mut membership = SystemMembership::new();
    for record in Reader::from_reader(reader).deserialize::<MembershipRecord>() {
        let MembershipRecord { year, country } = record?;
        membership.insert(year, country);
    }
    Ok(membership)
}

/// Read a system-membership table from a file.
pub fn read_membership(path: impl AsRef<Path>) -> Result<SystemMembership> {
    read_membership_from(File::open(path)?)
}

/// Read a country vocabulary.
pub fn read_vocabulary_from<R: Read>(reader: R) -> Result<Vocabulary> {
    Reader::from_reader(reader)
        .deserialize::<VocabularyRecord>()
        .map(|record| Ok(record?.country))
        .collect()
}

/// Read a country vocabulary from a file.
pub fn read_vocabulary(path: impl AsRef<Path>) -> Result<Vocabulary> {
    read_vocabulary_from(File::open(path)?)
}

/// Write a score table, one row per dyad.
pub fn write_scores_to<W: Write>(table: &HegemonyScoreTable, writer: W) -> Result<()> {
    let mut out = Writer::from_writer(writer);
    let mut header = vec!["year".to_string(), "ego".to_string(), "alter".to_string()];
    header.extend(table.columns().iter().cloned());
    out.write_record(&header)?;
    for (dyad, values) in table.rows() {
        let mut record = vec![dyad.year.to_string(), dyad.ego.to_string(), dyad.alter.to_string()];
        record.extend(values.iter().map(f64::to_string));
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a score table to a file.
pub fn write_scores(table: &HegemonyScoreTable, path: impl AsRef<Path>) -> Result<()> {
    write_scores_to(table, BufWriter::new(File::create(path)?))
}

/// Write the durable-hegemon table, one row per hegemon.
pub fn write_top_to<W: Write>(top: &HegemonyTopTable, writer: W) -> Result<()> {
    let mut out = Writer::from_writer(writer);
    let mut header = vec!["ego".to_string()];
    header.extend(top.years().iter().map(ToString::to_string));
    out.write_record(&header)?;
    for (ego, counts) in top.rows() {
        let mut record = vec![ego.to_string()];
        record.extend(counts.iter().map(ToString::to_string));
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Write the durable-hegemon table to a file.
pub fn write_top(top: &HegemonyTopTable, path: impl AsRef<Path>) -> Result<()> {
    write_top_to(top, BufWriter::new(File::create(path)?))
}

/// Write communities as pretty-printed JSON.
pub fn write_communities(index: &CommunityIndex, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, index)?;
    writer.flush()?;
    Ok(())
}

/// Read communities written by [`write_communities`].
pub fn read_communities(path: impl AsRef<Path>) -> Result<CommunityIndex> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::centrality::CentralityKind;
    use crate::config::{PipelineConfig, TopConfig};
    use crate::context::{AnalysisContext, Dyad};
    use crate::error::Error;
    use crate::pipeline::run;

    const TRIPLES: &str = "year,ego,alter,value\n\
        2000,A,B,10\n\
        2000,A,C,8\n\
        2000,B,A,1\n\
        2000,A,B,2\n";

    #[test]
    fn test_read_triples_sums_duplicates() -> Result<()> {
        let table = read_triples_from(TRIPLES.as_bytes())?;
        assert_eq!(table.len(), 3);
        let ab: Vec<f64> = table
            .year(2000)
            .filter(|(e, a, _)| e.as_str() == "A" && a.as_str() == "B")
            .map(|(_, _, v)| v)
            .collect();
        assert_eq!(ab, [12.0]);
        Ok(())
    }

    #[test]
    fn test_malformed_triples_fail() {
        let bad = "year,ego,alter,value\n2000,A,B,lots\n";
        assert!(matches!(read_triples_from(bad.as_bytes()), Err(Error::Csv(_))));
    }

    #[test]
    fn test_read_membership_and_vocabulary() -> Result<()> {
        let membership = read_membership_from("year,country\n2000,A\n2000,B\n2001,A\n".as_bytes())?;
        assert_eq!(membership.members(2000).count(), 2);
        assert_eq!(membership.dyads(2000, 2001).count(), 2);

        let vocabulary = read_vocabulary_from("country\nB\nA\nB\n".as_bytes())?;
        assert_eq!(vocabulary.len(), 2);
        Ok(())
    }

    #[test]
    fn test_outputs_round_trip_through_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let triples_path = dir.path().join("triples.csv");
        std::fs::write(&triples_path, TRIPLES)?;

        let ctx = AnalysisContext::from_triples(read_triples(&triples_path)?)?;
        let config = PipelineConfig::new()
            .with_resolution_steps([10])
            .with_centrality(CentralityKind::OutDegreeWeighted)
            .with_normalized_local_centrality(true)
            .with_relation("arms");
        let output = run(&ctx, &config, &TopConfig::new(0.5, 0.0))?;
        assert_eq!(output.scores.score(&Dyad::new(2000, "A", "B"), "arms"), Some(1.0));

        let scores_path = dir.path().join("scores.csv");
        write_scores(&output.scores, &scores_path)?;
        let written = std::fs::read_to_string(&scores_path)?;
        assert!(written.starts_with("year,ego,alter,arms\n"));
        assert!(written.contains("2000,A,B,1\n"));

        let top_path = dir.path().join("top.csv");
        write_top(&output.top, &top_path)?;
        assert_eq!(std::fs::read_to_string(&top_path)?, "ego,2000\nA,2\n");

        let communities_path = dir.path().join("communities.json");
        write_communities(&output.communities, &communities_path)?;
        assert_eq!(read_communities(&communities_path)?, output.communities);
        Ok(())
    }
}
