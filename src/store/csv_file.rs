use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use csv::ByteRecord;
use derive_new::new;
use snafu::ResultExt as _;
use tempfile::NamedTempFile;

use super::error::*;
use crate::model::{Video, VideoDraft, VideoId};

/// Column names, in the order every row is written.
pub const HEADER: [&str; 5] = ["id", "name", "href", "post_date", "views_count"];

#[derive(Debug, Clone)]
enum Row {
    Video(Video),
    /// A row that could not be loaded. It is written back untouched, with its
    /// columns in [HEADER] order.
    Kept {
        record: ByteRecord,
        id: Option<VideoId>,
    },
}

/// Every data row of the backing file, in file order.
///
/// Only valid rows are visible as videos, but rows that failed to load are
/// carried along so a rewrite never drops them and their ids stay taken.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    rows: Vec<Row>,
}

impl Collection {
    pub fn videos(&self) -> impl Iterator<Item = &Video> {
        self.rows.iter().filter_map(|row| match row {
            Row::Video(video) => Some(video),
            Row::Kept { .. } => None,
        })
    }

    pub fn into_videos(self) -> Vec<Video> {
        self.rows
            .into_iter()
            .filter_map(|row| match row {
                Row::Video(video) => Some(video),
                Row::Kept { .. } => None,
            })
            .collect()
    }

    /// Number of rows that did not load.
    pub fn kept(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| matches!(row, Row::Kept { .. }))
            .count()
    }

    pub fn get(&self, id: VideoId) -> Option<&Video> {
        self.videos().find(|video| video.id == id)
    }

    /// Whether any row, loaded or not, carries `id`.
    pub fn contains(&self, id: VideoId) -> bool {
        self.rows.iter().any(|row| match row {
            Row::Video(video) => video.id == id,
            Row::Kept { id: kept, .. } => *kept == Some(id),
        })
    }

    pub fn push(&mut self, video: Video) {
        self.rows.push(Row::Video(video));
    }

    /// Swaps in `video` for the loaded video with the same id, returning the
    /// previous one.
    pub fn replace(&mut self, video: Video) -> Option<Video> {
        self.rows.iter_mut().find_map(|row| match row {
            Row::Video(existing) if existing.id == video.id => {
                Some(std::mem::replace(existing, video.clone()))
            }
            _ => None,
        })
    }

    /// Removes the loaded video with `id`, together with any row kept aside
    /// under the same id, so a stale duplicate cannot take its place.
    pub fn remove(&mut self, id: VideoId) -> Option<Video> {
        let position = self
            .rows
            .iter()
            .position(|row| matches!(row, Row::Video(video) if video.id == id))?;

        let removed = match self.rows.remove(position) {
            Row::Video(video) => Some(video),
            Row::Kept { .. } => None,
        };

        self.rows
            .retain(|row| !matches!(row, Row::Kept { id: Some(kept), .. } if *kept == id));

        removed
    }
}

impl FromIterator<Video> for Collection {
    fn from_iter<I: IntoIterator<Item = Video>>(videos: I) -> Self {
        Self {
            rows: videos.into_iter().map(Row::Video).collect(),
        }
    }
}

/// The CSV file that holds the whole collection.
#[derive(Debug, Clone, new)]
pub struct CsvFile {
    path: PathBuf,
}

impl CsvFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub fn ensure_directory(&self) -> Result<(), StorageError> {
        let directory = self.directory();
        fs::create_dir_all(directory).context(CreateDirectorySnafu { path: directory })
    }

    /// Reads every row in file order.
    ///
    /// A missing file is an empty collection. Rows that cannot be parsed, fail
    /// validation, or repeat an earlier id are logged and kept aside as they
    /// were read.
    pub fn load(&self) -> Result<Collection, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "backing file does not exist yet");
                return Ok(Collection::default());
            }
            Err(error) => return Err(error).context(OpenSnafu { path: &self.path }),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        let headers = reader
            .byte_headers()
            .context(ReadSnafu { path: &self.path })?
            .clone();

        // position of each HEADER column in this file
        let columns: Vec<Option<usize>> = HEADER
            .iter()
            .map(|name| headers.iter().position(|header| header == name.as_bytes()))
            .collect();

        let mut seen = HashSet::new();
        let mut collection = Collection::default();

        for (index, row) in reader.byte_records().enumerate() {
            let record = row.context(ReadSnafu { path: &self.path })?;
            let line = index + 1;

            let keep = |id: Option<VideoId>| Row::Kept {
                record: columns
                    .iter()
                    .map(|column| column.and_then(|column| record.get(column)).unwrap_or_default())
                    .collect(),
                id,
            };

            let draft = match record.deserialize::<VideoDraft>(Some(&headers)) {
                Ok(draft) => draft,
                Err(error) => {
                    tracing::warn!(path = %self.path.display(), record = line, %error, "keeping unreadable row aside");
                    let id = columns[0]
                        .and_then(|column| record.get(column))
                        .and_then(|field| std::str::from_utf8(field).ok())
                        .and_then(|field| field.parse().ok());
                    collection.rows.push(keep(id));
                    continue;
                }
            };

            let id = draft.id;
            let video = match draft.validate() {
                Ok(video) => video,
                Err(error) => {
                    tracing::warn!(path = %self.path.display(), record = line, %error, "keeping invalid row aside");
                    collection.rows.push(keep(Some(id)));
                    continue;
                }
            };

            if !seen.insert(id) {
                tracing::warn!(path = %self.path.display(), record = line, video_id = id, "keeping row with duplicate id aside");
                collection.rows.push(keep(Some(id)));
                continue;
            }

            collection.push(video);
        }

        Ok(collection)
    }

    /// Replaces the file with `collection`.
    ///
    /// Rows go to a temporary file in the same directory which is synced and
    /// then renamed over the old file, so readers see either the old or the new
    /// collection and never a torn write. The old file's permissions carry over.
    pub fn persist(&self, collection: &Collection) -> Result<(), StorageError> {
        self.ensure_directory()?;

        let directory = self.directory();
        let temporary =
            NamedTempFile::new_in(directory).context(CreateTemporarySnafu { path: directory })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(temporary);

        writer
            .write_record(HEADER)
            .context(WriteSnafu { path: &self.path })?;

        for row in &collection.rows {
            match row {
                Row::Video(video) => writer.serialize(video),
                Row::Kept { record, .. } => writer.write_byte_record(record),
            }
            .context(WriteSnafu { path: &self.path })?;
        }

        let temporary = writer
            .into_inner()
            .map_err(|error| error.into_error())
            .context(FlushSnafu { path: &self.path })?;

        match fs::metadata(&self.path) {
            Ok(metadata) => temporary
                .as_file()
                .set_permissions(metadata.permissions())
                .context(PermissionsSnafu { path: &self.path })?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(error).context(PermissionsSnafu { path: &self.path }),
        }

        temporary
            .as_file()
            .sync_all()
            .context(FlushSnafu { path: &self.path })?;

        temporary
            .persist(&self.path)
            .context(PersistSnafu { path: &self.path })?;

        tracing::debug!(
            path = %self.path.display(),
            rows = collection.rows.len(),
            kept = collection.kept(),
            "rewrote backing file"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn video(id: i64, name: &str) -> Video {
        VideoDraft::new(
            id,
            name.to_string(),
            format!("http://x/{id}"),
            "2025-01-01".to_string(),
            id * 10,
        )
        .validate()
        .unwrap()
    }

    fn collection(videos: &[Video]) -> Collection {
        videos.iter().cloned().collect()
    }

    fn ids(collection: &Collection) -> Vec<i64> {
        collection.videos().map(|video| video.id).collect()
    }

    const MIXED: &str = "id,name,href,post_date,views_count\n\
                         1,A,http://x/1,2025-01-01,10\n\
                         two,B,http://x/2,2025-01-01,20\n\
                         3,C,http://x/3,2025-02-30,30\n\
                         4,D,http://x/4,2025-01-04,-1\n\
                         1,E,http://x/5,2025-01-05,50\n\
                         7,G\n\
                         6,F,http://x/6,2025-01-06,60\n";

    #[test]
    fn missing_file_is_an_empty_collection() {
        let dir = TempDir::new().unwrap();
        let file = CsvFile::new(dir.path().join("videos.csv"));

        assert_eq!(file.load().unwrap().into_videos(), vec![]);
    }

    #[test]
    fn empty_file_is_an_empty_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        fs::write(&path, "").unwrap();

        assert_eq!(CsvFile::new(path).load().unwrap().into_videos(), vec![]);
    }

    #[test]
    fn persist_writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        let file = CsvFile::new(path.clone());

        file.persist(&collection(&[video(1, "A"), video(2, "B")]))
            .unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "id,name,href,post_date,views_count\n\
             1,A,http://x/1,2025-01-01,10\n\
             2,B,http://x/2,2025-01-01,20\n"
        );
    }

    #[test]
    fn empty_collection_still_has_a_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");

        CsvFile::new(path.clone())
            .persist(&Collection::default())
            .unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "id,name,href,post_date,views_count\n"
        );
    }

    #[test]
    fn delimiters_in_values_survive_a_round_trip() {
        let dir = TempDir::new().unwrap();
        let file = CsvFile::new(dir.path().join("videos.csv"));
        let tricky = vec![
            video(1, "Hello, world"),
            video(2, "She said \"hi\""),
            video(3, "two\nlines"),
        ];

        file.persist(&collection(&tricky)).unwrap();

        assert_eq!(file.load().unwrap().into_videos(), tricky);
    }

    #[test]
    fn parent_directory_is_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("nested").join("videos.csv");
        let file = CsvFile::new(path.clone());

        file.persist(&collection(&[video(1, "A")])).unwrap();

        assert!(path.exists());
        assert_eq!(file.load().unwrap().into_videos(), vec![video(1, "A")]);
    }

    #[test]
    fn invalid_and_duplicate_rows_are_not_videos() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        fs::write(&path, MIXED).unwrap();

        let loaded = CsvFile::new(path).load().unwrap();

        assert_eq!(ids(&loaded), vec![1, 6]);
        assert_eq!(loaded.kept(), 5);
    }

    #[test]
    fn rows_that_did_not_load_are_written_back_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        fs::write(&path, MIXED).unwrap();
        let file = CsvFile::new(path.clone());

        let mut loaded = file.load().unwrap();
        loaded.push(video(8, "H"));
        file.persist(&loaded).unwrap();

        let expected = MIXED.replace("7,G\n", "7,G,,,\n") + "8,H,http://x/8,2025-01-01,80\n";
        assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    }

    #[test]
    fn ids_of_rows_that_did_not_load_are_taken() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        fs::write(&path, MIXED).unwrap();

        let loaded = CsvFile::new(path).load().unwrap();

        for id in [1, 3, 4, 6, 7] {
            assert!(loaded.contains(id), "id {id} should be taken");
        }
        assert!(!loaded.contains(2), "`two` is not an id");
        assert_eq!(loaded.get(3), None);
    }

    #[test]
    fn replace_and_remove_only_touch_loaded_videos() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        fs::write(&path, MIXED).unwrap();
        let mut loaded = CsvFile::new(path).load().unwrap();

        assert_eq!(loaded.replace(video(3, "C")), None);
        assert_eq!(loaded.remove(4), None);

        let previous = loaded.replace(video(6, "changed")).unwrap();
        assert_eq!(previous.name, "F");
        assert_eq!(loaded.get(6).map(|video| video.name.as_str()), Some("changed"));

        assert_eq!(loaded.remove(1).map(|video| video.name), Some("A".to_string()));
        assert_eq!(ids(&loaded), vec![6]);
        assert_eq!(loaded.kept(), 4, "the duplicate of id 1 goes with it");
        assert!(!loaded.contains(1));
    }

    #[test]
    fn columns_are_matched_by_header_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        fs::write(
            &path,
            "views_count,post_date,href,name,id\n10,2025-01-01,http://x/1,A,1\n",
        )
        .unwrap();

        assert_eq!(
            CsvFile::new(path).load().unwrap().into_videos(),
            vec![video(1, "A")]
        );
    }

    #[test]
    fn kept_rows_are_rewritten_in_header_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        fs::write(
            &path,
            "views_count,post_date,href,name,id\n-5,2025-01-01,http://x/9,Z,9\n",
        )
        .unwrap();
        let file = CsvFile::new(path.clone());

        file.persist(&file.load().unwrap()).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "id,name,href,post_date,views_count\n9,Z,http://x/9,2025-01-01,-5\n"
        );
    }

    #[test]
    fn persist_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let file = CsvFile::new(dir.path().join("videos.csv"));

        file.persist(&collection(&[video(1, "A"), video(2, "B")]))
            .unwrap();
        file.persist(&collection(&[video(2, "B")])).unwrap();

        assert_eq!(file.load().unwrap().into_videos(), vec![video(2, "B")]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1, "no temporary files are left behind");
    }

    #[cfg(unix)]
    #[test]
    fn persist_keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt as _;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        let file = CsvFile::new(path.clone());

        file.persist(&collection(&[video(1, "A")])).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        file.persist(&collection(&[video(1, "A"), video(2, "B")]))
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn failed_rename_leaves_the_target_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("inside"), "untouched").unwrap();

        let error = CsvFile::new(path.clone())
            .persist(&collection(&[video(1, "A")]))
            .unwrap_err();

        assert!(matches!(error, StorageError::Persist { .. }), "{error}");
        assert_eq!(fs::read_to_string(path.join("inside")).unwrap(), "untouched");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1, "the temporary file is removed");
    }
}
