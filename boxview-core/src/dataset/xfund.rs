//! XFUND-style dataset output and its generator.

use std::{
    collections::BTreeSet,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tracing::*;

use crate::{
    analysis::bbox::Rect,
    client::OcrBackend,
    consts::DATASET_IMAGE_EXTENSION,
    error::{BoxviewError, ImageReadSnafu, IoReadSnafu, IoWriteSnafu, JsonSnafu},
    recognize::crop_and_recognize,
};

use super::studio::StudioTask;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XfundDataset {
    pub documents: Vec<XfundDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XfundDocument {
    pub id: String,
    pub document: Vec<XfundEntity>,
    pub img: XfundImage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XfundEntity {
    pub id: String,
    /// `null` when recognition failed.
    pub text: Option<String>,
    pub label: String,
    #[serde(rename = "box")]
    pub bbox: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XfundImage {
    pub fname: String,
    pub width: u32,
    pub height: u32,
}

/// Builds the dataset from annotation tasks, recognizing every kept
/// rectangle through `backend`.
pub struct XfundGenerator<B> {
    backend: B,
    skip_labels: BTreeSet<String>,
}

impl<B: OcrBackend> XfundGenerator<B> {
    pub fn new(backend: B, skip_labels: BTreeSet<String>) -> Self {
        Self {
            backend,
            skip_labels,
        }
    }

    /// Reads the export, generates the dataset and writes it out.
    pub fn run(
        &self,
        studio_path: &Path,
        img_folder: &Path,
        output_path: &Path,
    ) -> Result<XfundDataset, BoxviewError> {
        let tasks = read_tasks(studio_path)?;
        info!("loaded {} tasks from {}", tasks.len(), studio_path.display());

        let dataset = self.generate(&tasks, img_folder);
        write_dataset(output_path, &dataset)?;
        info!(
            "wrote {} documents to {}",
            dataset.documents.len(),
            output_path.display()
        );

        Ok(dataset)
    }

    /// One document per task; tasks whose image can't be resolved are
    /// logged and left out.
    pub fn generate(&self, tasks: &[StudioTask], img_folder: &Path) -> XfundDataset {
        let documents = tasks
            .iter()
            .filter_map(|task| match self.document(task, img_folder) {
                Ok(document) => Some(document),
                Err(err) => {
                    warn!("skip task {}: {}", task.file_upload, err);
                    None
                }
            })
            .collect();

        XfundDataset { documents }
    }

    pub fn document(
        &self,
        task: &StudioTask,
        img_folder: &Path,
    ) -> Result<XfundDocument, BoxviewError> {
        let image_name = task.image_name()?;
        let fname = format!("{image_name}.{DATASET_IMAGE_EXTENSION}");
        let image_path = img_folder.join(&fname);

        let image = image::open(&image_path).context(ImageReadSnafu {
            path: image_path.to_string_lossy(),
        })?;
        info!(
            "processing {} ({}x{})",
            image_path.display(),
            image.width(),
            image.height()
        );

        Ok(XfundDocument {
            id: image_name.to_string(),
            document: self.entities(task, &image),
            img: XfundImage {
                fname,
                width: image.width(),
                height: image.height(),
            },
        })
    }

    /// Kept rectangles of a task with their recognized text.
    pub fn entities(&self, task: &StudioTask, image: &DynamicImage) -> Vec<XfundEntity> {
        let mut entities = Vec::new();

        for result in task.results() {
            let Some(label) = result.label() else {
                warn!("result {} of {} has no label", result.id, task.file_upload);
                continue;
            };
            if self.skip_labels.contains(label) {
                debug!("skip result {} labelled {label}", result.id);
                continue;
            }

            let bbox = result.value.to_pixels(image.width(), image.height());
            let text = crop_and_recognize(&self.backend, image, bbox);
            debug!("result {} [{label}] -> {:?}", result.id, text);

            entities.push(XfundEntity {
                id: result.id.clone(),
                text,
                label: label.to_string(),
                bbox,
            });
        }

        entities
    }
}

pub fn read_tasks(path: &Path) -> Result<Vec<StudioTask>, BoxviewError> {
    let file = File::open(path).context(IoReadSnafu {
        path: path.to_string_lossy(),
    })?;
    serde_json::from_reader(BufReader::new(file)).context(JsonSnafu {
        stage: "read-annotations",
    })
}

/// Writes the dataset as UTF-8 JSON indented with four spaces.
pub fn write_dataset(path: &Path, dataset: &XfundDataset) -> Result<(), BoxviewError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context(IoWriteSnafu {
            path: parent.to_string_lossy(),
        })?;
    }

    let file = File::create(path).context(IoWriteSnafu {
        path: path.to_string_lossy(),
    })?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    dataset.serialize(&mut serializer).context(JsonSnafu {
        stage: "write-dataset",
    })?;

    writer.flush().context(IoWriteSnafu {
        path: path.to_string_lossy(),
    })
}
