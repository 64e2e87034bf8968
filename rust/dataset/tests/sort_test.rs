// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sorting a dataset laid out the way `tdg generate` writes it:
//! `dataset<ts>/output<n>/<i>.{colors,segmap}.png`.

use std::fs;
use std::path::Path;

use chrono::{Local, TimeZone};
use image::{ImageBuffer, LumaA, Rgb};
use tdg_dataset::{sort_dataset, ClassifierOptions};

fn write_render(dir: &Path, index: u32, defect_pixels: u32) {
    fs::create_dir_all(dir).unwrap();
    let label: ImageBuffer<LumaA<u16>, Vec<u16>> = ImageBuffer::from_fn(40, 40, |x, y| {
        let i = y * 40 + x;
        let class = if i < defect_pixels {
            2
        } else if x >= 20 {
            1
        } else {
            0
        };
        LumaA([class, (i % 7) as u16])
    });
    label
        .save(dir.join(format!("{}.segmap.png", index)))
        .unwrap();
    ImageBuffer::from_pixel(40, 40, Rgb([index as u8, 0u8, 0u8]))
        .save(dir.join(format!("{}.colors.png", index)))
        .unwrap();
}

#[test]
fn test_sort_generated_layout() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("dataset2024-06-01_08-00-00");
    write_render(&dataset.join("output0"), 0, 0);
    write_render(&dataset.join("output1"), 0, 120);
    write_render(&dataset.join("output2"), 0, 20);
    write_render(&dataset.join("output3"), 0, 50);
    write_render(&dataset.join("output4"), 0, 0);

    let now = Local.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).earliest().unwrap();
    let report = sort_dataset(dir.path(), &ClassifierOptions::default(), now).unwrap();
    println!("{:?}", report.as_array());
    assert_eq!(report.as_array(), [2, 2, 0, 1]);

    let out = dir.path().join("sorted_dataset2024-06-02_09-30-00");
    for bucket in ["defect", "faultfree"] {
        for i in 0..2 {
            assert!(out.join(bucket).join(format!("{}.segmap.png", i)).is_file());
            assert!(out.join(bucket).join(format!("{}.colors.png", i)).is_file());
        }
        assert!(!out.join(bucket).join("2.segmap.png").exists());
    }

    // output1 (120 defect pixels) is the first defect image in path order
    assert_eq!(
        fs::read(out.join("defect/0.colors.png")).unwrap(),
        fs::read(dataset.join("output1/0.colors.png")).unwrap()
    );
}

#[test]
fn test_custom_threshold() {
    let dir = tempfile::tempdir().unwrap();
    write_render(&dir.path().join("output0"), 0, 20);

    let options = ClassifierOptions {
        threshold: 10,
        ..ClassifierOptions::default()
    };
    let now = Local.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).earliest().unwrap();
    let report = sort_dataset(dir.path(), &options, now).unwrap();
    assert_eq!(report.defect, 1);
}
