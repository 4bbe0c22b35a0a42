use std::path::PathBuf;

/// Identity and layout of the raw DeepPlanning release.
///
/// Archive names, partition lists and the required output table set are plain
/// data so builders and the validator can be exercised with injected values
/// instead of reaching for ambient constants.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    /// Source dataset id on the HF hub.
    pub hf_dataset_id: String,
    /// Shopping difficulty levels, one tar archive and one query file each.
    pub shopping_levels: Vec<u32>,
    /// Travel languages, one zip archive and one query file each.
    pub travel_languages: Vec<String>,
    /// Tables the validator refuses to run without.
    pub required_tables: Vec<String>,
}

impl Default for DatasetSpec {
    fn default() -> Self {
        Self {
            hf_dataset_id: "Qwen/DeepPlanning".to_string(),
            shopping_levels: vec![1, 2, 3],
            travel_languages: vec!["en".to_string(), "zh".to_string()],
            required_tables: [
                "shopping_queries",
                "shopping_cases",
                "shopping_gt_products",
                "shopping_catalog",
                "shopping_user_info",
                "travel_queries",
                "travel_constraints",
                "travel_db_trains",
                "travel_db_flights",
                "travel_db_hotels",
                "travel_db_restaurants",
                "travel_db_attractions",
                "travel_db_locations",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl DatasetSpec {
    pub fn shopping_archive(&self, level: u32) -> String {
        format!("database_level{level}.tar.gz")
    }

    pub fn travel_archive(&self, language: &str) -> String {
        format!("database_{language}.zip")
    }

    /// The full archive list fetched from the hub, zips first to match the
    /// published file layout.
    pub fn raw_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self
            .travel_languages
            .iter()
            .map(|lang| self.travel_archive(lang))
            .collect();
        files.extend(self.shopping_levels.iter().map(|l| self.shopping_archive(*l)));
        files
    }
}

/// Per-run build parameters, assembled by the CLI.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Qwen-Agent benchmark root holding `shoppingplanning/` and `travelplanning/`.
    pub source_root: PathBuf,
    /// Cache directory for downloaded raw archives.
    pub raw_cache_dir: PathBuf,
    /// Extraction working directory.
    pub work_dir: PathBuf,
    /// Output parquet directory.
    pub out_dir: PathBuf,
    /// Include the travel distance matrix table, by far the largest output.
    pub include_distance_matrix: bool,
    /// Skip download and extraction, reusing consolidated roots already in
    /// the work dir.
    pub offline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_raw_file_list() {
        let spec = DatasetSpec::default();
        assert_eq!(
            spec.raw_files(),
            vec![
                "database_en.zip",
                "database_zh.zip",
                "database_level1.tar.gz",
                "database_level2.tar.gz",
                "database_level3.tar.gz",
            ]
        );
    }

    #[test]
    fn required_table_count() {
        assert_eq!(DatasetSpec::default().required_tables.len(), 13);
    }
}
