//! Common test utilities for mediaflow integration tests
//!
//! Fixture files written into temp directories, and a scripted adapter
//! whose activity can be observed from the test.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, RgbImage};
use mediaflow::{Adapter, AdapterError, Environment, ItemData, MediaConfig, Outcome};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Write a solid-color image of the given size and format.
pub fn write_image(dir: &Path, name: &str, width: u32, height: u32, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .save_with_format(&path, format)
        .unwrap();
    path
}

pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    write_image(dir, name, width, height, ImageFormat::Jpeg)
}

/// Observed activity of every [`ScriptedAdapter`] built by one factory.
#[derive(Clone, Default)]
pub struct Activity {
    inits: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Activity {
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

/// Adapter answering a fixed set of operations with its own name.
pub struct ScriptedAdapter {
    name: &'static str,
    operations: Vec<&'static str>,
    activity: Activity,
}

impl Adapter for ScriptedAdapter {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> Vec<&str> {
        self.operations.clone()
    }

    fn initialize(&mut self, _item: &mut ItemData) -> Result<(), AdapterError> {
        self.activity.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn call(
        &mut self,
        operation: &str,
        _item: &mut ItemData,
        _args: &[Value],
    ) -> Result<Outcome, AdapterError> {
        self.activity
            .calls
            .lock()
            .unwrap()
            .push(format!("{}::{}", self.name, operation));
        Ok(Outcome::value(self.name))
    }
}

/// Environment from `config` with scripted adapters registered under the
/// given names; returns the activity handle for each, in the same order.
pub fn env_with_scripted(
    config: MediaConfig,
    adapters: &[(&'static str, &[&'static str])],
) -> (Arc<Environment>, Vec<Activity>) {
    let mut builder = Environment::builder().config(config);
    let mut activities = Vec::new();
    for &(name, operations) in adapters {
        let activity = Activity::default();
        activities.push(activity.clone());
        let operations = operations.to_vec();
        builder = builder.adapter(name, move |_| {
            Ok(Box::new(ScriptedAdapter {
                name,
                operations: operations.clone(),
                activity: activity.clone(),
            }))
        });
    }
    (builder.build(), activities)
}
