//! Removal of images that repeat across a deck.
//!
//! Every picture on every master, layout and slide (including pictures
//! nested in groups) is hashed. Hashes are clustered greedily in discovery
//! order: each hash joins the first cluster whose representative is within
//! the tolerance, or starts a new one. Clusters with enough members are
//! treated as decoration (logos, footers, stock banners) and deleted whole.
//!
//! Discovery order matters, so the result is a heuristic and not an exact
//! duplicate finder.

use crate::deck::{ContainerRef, Deck};
use crate::phash::PerceptualHash;
use crate::shapes;
use slidecraft_core::Result;
use std::collections::BTreeMap;

/// Clustering thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupOptions {
    /// Clusters with at least this many pictures are removed.
    pub min_occurrences: usize,
    /// Maximum hash distance, in bits, to a cluster's representative.
    pub hash_tolerance: u32,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            min_occurrences: 3,
            hash_tolerance: 5,
        }
    }
}

impl DedupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_occurrences(mut self, min_occurrences: usize) -> Self {
        self.min_occurrences = min_occurrences;
        self
    }

    pub fn with_hash_tolerance(mut self, hash_tolerance: u32) -> Self {
        self.hash_tolerance = hash_tolerance;
        self
    }
}

/// Where a picture lives; does not own the shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ShapeRef {
    pub container: ContainerRef,
    pub path: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageHashRecord {
    pub shape: ShapeRef,
    pub hash: PerceptualHash,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashCluster {
    pub representative: PerceptualHash,
    pub members: Vec<ShapeRef>,
}

/// Outcome of a dedup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub pictures_hashed: usize,
    pub clusters: usize,
    pub shapes_removed: usize,
}

/// Hash every decodable picture, masters first, then layouts, then slides.
pub fn collect_image_hashes(deck: &Deck) -> Result<Vec<ImageHashRecord>> {
    let mut records = Vec::new();
    for container in deck.containers() {
        let tree = deck.shapes(container)?;
        for picture in shapes::pictures(&tree) {
            let Some(bytes) = deck.picture_bytes(container, picture) else {
                log::debug!("No image data for '{}' in {:?}", picture.name, container);
                continue;
            };
            match PerceptualHash::from_bytes(bytes) {
                Ok(hash) => records.push(ImageHashRecord {
                    shape: ShapeRef {
                        container,
                        path: picture.path.clone(),
                    },
                    hash,
                }),
                Err(e) => log::debug!("Skipping '{}' in {:?}: {}", picture.name, container, e),
            }
        }
    }
    Ok(records)
}

/// Greedy first-match clustering. Cluster order is first-seen order.
pub fn cluster_hashes(records: Vec<ImageHashRecord>, tolerance: u32) -> Vec<HashCluster> {
    let mut clusters: Vec<HashCluster> = Vec::new();
    for record in records {
        match clusters
            .iter_mut()
            .find(|c| c.representative.distance(&record.hash) <= tolerance)
        {
            Some(cluster) => cluster.members.push(record.shape),
            None => clusters.push(HashCluster {
                representative: record.hash,
                members: vec![record.shape],
            }),
        }
    }
    clusters
}

/// Remove every picture belonging to a cluster of `min_occurrences` or more.
pub fn dedup(deck: &mut Deck, options: &DedupOptions) -> Result<DedupReport> {
    let records = collect_image_hashes(deck)?;
    let pictures_hashed = records.len();
    let clusters = cluster_hashes(records, options.hash_tolerance);

    let mut doomed: BTreeMap<ContainerRef, Vec<Vec<usize>>> = BTreeMap::new();
    for cluster in &clusters {
        if cluster.members.len() < options.min_occurrences {
            continue;
        }
        log::debug!(
            "Removing cluster {:016x} with {} pictures",
            cluster.representative.bits(),
            cluster.members.len()
        );
        for member in &cluster.members {
            doomed
                .entry(member.container)
                .or_default()
                .push(member.path.clone());
        }
    }

    let mut shapes_removed = 0;
    for (container, paths) in doomed {
        shapes_removed += deck.remove_shapes(container, &paths)?;
    }

    log::info!(
        "Dedup: {} pictures in {} clusters, {} removed",
        pictures_hashed,
        clusters.len(),
        shapes_removed
    );
    Ok(DedupReport {
        pictures_hashed,
        clusters: clusters.len(),
        shapes_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::PictureData;
    use crate::package::Package;
    use crate::shapes::EmuRect;
    use crate::xml::{XmlElement, XmlNode};
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png(img: &RgbImage) -> PictureData {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        PictureData::from_bytes(buf.into_inner()).unwrap()
    }

    fn logo_image() -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| {
            if x < 32 && y < 40 {
                Rgb([240, 240, 240])
            } else {
                Rgb([(x * 3) as u8, 20, (y * 2) as u8])
            }
        })
    }

    fn logo() -> PictureData {
        png(&logo_image())
    }

    fn photo() -> PictureData {
        png(&RgbImage::from_fn(64, 64, |x, y| {
            if (x as i32 - 40).pow(2) + (y as i32 - 20).pow(2) < 200 {
                Rgb([10, 10, 10])
            } else {
                Rgb([200, (255 - y * 3) as u8, 90])
            }
        }))
    }

    fn deck_with(placements: &[(ContainerRef, &PictureData)]) -> Deck {
        let mut deck = Deck::new().unwrap();
        let slides = placements
            .iter()
            .filter_map(|(c, _)| match c {
                ContainerRef::Slide(i) => Some(*i + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        for _ in 0..slides {
            deck.add_slide(0).unwrap();
        }
        for (container, picture) in placements {
            deck.add_picture(*container, picture, EmuRect::new(0, 0, 914_400, 914_400))
                .unwrap();
        }
        deck
    }

    fn group(id: u32, child: XmlElement) -> XmlElement {
        XmlElement::new("p:grpSp")
            .with_child(
                XmlElement::new("p:nvGrpSpPr")
                    .with_child(
                        XmlElement::new("p:cNvPr")
                            .with_attr("id", id.to_string())
                            .with_attr("name", format!("Group {}", id)),
                    )
                    .with_child(XmlElement::new("p:cNvGrpSpPr"))
                    .with_child(XmlElement::new("p:nvPr")),
            )
            .with_child(XmlElement::new("p:grpSpPr"))
            .with_child(child)
    }

    /// Rewrite the first slide so its n-th picture sits `depths[n]` groups deep.
    fn nest_pictures(deck: &mut Deck, depths: &[usize]) -> Deck {
        let mut bytes = Cursor::new(Vec::new());
        deck.write_to(&mut bytes).unwrap();
        let mut package = Package::from_reader(Cursor::new(bytes.into_inner())).unwrap();

        let slide = "ppt/slides/slide1.xml";
        let mut xml = package.part_xml(slide).unwrap();
        let tree = xml.find_mut(&["cSld", "spTree"]).unwrap();
        let picture_slots: Vec<usize> = tree
            .children
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, XmlNode::Element(e) if e.local_name() == "pic"))
            .map(|(i, _)| i)
            .collect();

        let mut next_id = 100;
        for (slot, depth) in picture_slots.into_iter().zip(depths) {
            let XmlNode::Element(mut element) = tree.children[slot].clone() else {
                continue;
            };
            for _ in 0..*depth {
                element = group(next_id, element);
                next_id += 1;
            }
            tree.children[slot] = XmlNode::Element(element);
        }
        package.set_part(slide, xml.to_xml().unwrap().into_bytes());

        let mut out = Cursor::new(Vec::new());
        package.write_to(&mut out).unwrap();
        Deck::from_bytes(&out.into_inner()).unwrap()
    }

    fn reopened(deck: &mut Deck) -> Deck {
        let mut bytes = Cursor::new(Vec::new());
        deck.write_to(&mut bytes).unwrap();
        Deck::from_bytes(&bytes.into_inner()).unwrap()
    }

    fn picture_count(deck: &Deck) -> usize {
        deck.containers()
            .into_iter()
            .map(|c| shapes::pictures(&deck.shapes(c).unwrap()).len())
            .sum()
    }

    #[test]
    fn test_three_copies_are_removed() {
        let logo = logo();
        let photo = photo();
        let mut deck = deck_with(&[
            (ContainerRef::Slide(0), &logo),
            (ContainerRef::Slide(1), &logo),
            (ContainerRef::Slide(2), &logo),
            (ContainerRef::Slide(1), &photo),
        ]);

        let report = dedup(&mut deck, &DedupOptions::default()).unwrap();
        assert_eq!(report.pictures_hashed, 4);
        assert_eq!(report.shapes_removed, 3);
        assert_eq!(picture_count(&deck), 1);
    }

    #[test]
    fn test_two_copies_are_kept() {
        let logo = logo();
        let mut deck = deck_with(&[(ContainerRef::Slide(0), &logo), (ContainerRef::Slide(1), &logo)]);

        let report = dedup(&mut deck, &DedupOptions::default()).unwrap();
        assert_eq!(report.shapes_removed, 0);
        assert_eq!(picture_count(&deck), 2);
    }

    #[test]
    fn test_copies_across_master_layout_and_slide() {
        let logo = logo();
        let mut deck = deck_with(&[
            (ContainerRef::Master(0), &logo),
            (ContainerRef::Layout(0), &logo),
            (ContainerRef::Slide(0), &logo),
        ]);

        let report = dedup(&mut deck, &DedupOptions::default()).unwrap();
        assert_eq!(report.shapes_removed, 3);
        assert_eq!(picture_count(&deck), 0);
    }

    #[test]
    fn test_same_slide_copies_removed_together() {
        let logo = logo();
        let mut deck = deck_with(&[
            (ContainerRef::Slide(0), &logo),
            (ContainerRef::Slide(0), &logo),
            (ContainerRef::Slide(0), &logo),
        ]);

        dedup(&mut deck, &DedupOptions::default()).unwrap();
        assert_eq!(picture_count(&deck), 0);
    }

    #[test]
    fn test_custom_threshold() {
        let logo = logo();
        let mut deck = deck_with(&[(ContainerRef::Slide(0), &logo), (ContainerRef::Slide(1), &logo)]);

        let options = DedupOptions::new().with_min_occurrences(2);
        assert_eq!(dedup(&mut deck, &options).unwrap().shapes_removed, 2);
    }

    #[test]
    fn test_greedy_clustering_is_first_match() {
        let shape = |i| ShapeRef {
            container: ContainerRef::Slide(i),
            path: vec![2],
        };
        let records = vec![
            ImageHashRecord { shape: shape(0), hash: PerceptualHash::new(0) },
            ImageHashRecord { shape: shape(1), hash: PerceptualHash::new(0b111) },
            ImageHashRecord { shape: shape(2), hash: PerceptualHash::new(0b111111) },
            ImageHashRecord { shape: shape(3), hash: PerceptualHash::new(0b1) },
        ];

        let clusters = cluster_hashes(records, 3);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members, vec![shape(0), shape(1), shape(3)]);
        assert_eq!(clusters[1].representative, PerceptualHash::new(0b111111));
    }

    #[test]
    fn test_pictures_inside_groups_are_removed() {
        let logo = logo();
        let photo = photo();
        let mut flat = deck_with(&[
            (ContainerRef::Slide(0), &logo),
            (ContainerRef::Slide(0), &logo),
            (ContainerRef::Slide(0), &logo),
            (ContainerRef::Slide(0), &photo),
        ]);
        let mut deck = nest_pictures(&mut flat, &[0, 1, 2, 1]);

        let shapes = deck.shapes(ContainerRef::Slide(0)).unwrap();
        let paths: Vec<usize> = shapes::pictures(&shapes).iter().map(|s| s.path.len()).collect();
        assert_eq!(paths, vec![1, 2, 3, 2]);

        let report = dedup(&mut deck, &DedupOptions::default()).unwrap();
        assert_eq!(report.pictures_hashed, 4);
        assert_eq!(report.shapes_removed, 3);

        let reopened = reopened(&mut deck);
        let shapes = reopened.shapes(ContainerRef::Slide(0)).unwrap();
        let left = shapes::pictures(&shapes);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].path.len(), 2);
    }

    #[test]
    fn test_near_duplicates_form_one_cluster() {
        let base = logo_image();
        let mut brighter = base.clone();
        for pixel in brighter.pixels_mut() {
            pixel.0 = pixel.0.map(|v| v.saturating_add(4));
        }
        let mut specked = base.clone();
        for (x, y) in [(50, 50), (51, 50), (50, 51), (51, 51)] {
            specked.put_pixel(x, y, Rgb([255, 255, 255]));
        }

        let variants = [png(&base), png(&brighter), png(&specked)];
        assert_ne!(variants[0].bytes, variants[1].bytes);
        assert_ne!(variants[0].bytes, variants[2].bytes);

        let photo = photo();
        let mut deck = deck_with(&[
            (ContainerRef::Slide(0), &variants[0]),
            (ContainerRef::Slide(1), &variants[1]),
            (ContainerRef::Slide(2), &variants[2]),
            (ContainerRef::Slide(2), &photo),
        ]);

        let report = dedup(&mut deck, &DedupOptions::default()).unwrap();
        assert_eq!(report.clusters, 2);
        assert_eq!(report.shapes_removed, 3);
        assert_eq!(picture_count(&deck), 1);
    }
}
