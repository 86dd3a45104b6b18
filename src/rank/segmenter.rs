//! Heading + body segmentation for ranking.

use super::options::SegmentOptions;
use crate::model::{DocumentLayout, DocumentStructure, PageLayout, Section, Span};
use crate::parser::LineReconstructor;

/// A text block as the segmenter sees it.
#[derive(Debug)]
struct TextBlock {
    text: String,
    /// Size and flags of the first span, if the block has one
    lead: Option<(f32, u32)>,
}

fn lead_style(span: Option<&Span>) -> Option<(f32, u32)> {
    span.map(|s| (s.size, s.flags))
}

/// Splits documents into heading-led sections.
#[derive(Debug, Clone, Default)]
pub struct SectionSegmenter {
    options: SegmentOptions,
    lines: LineReconstructor,
}

impl SectionSegmenter {
    pub fn new(options: SegmentOptions) -> Self {
        Self {
            options,
            lines: LineReconstructor::new(),
        }
    }

    pub fn options(&self) -> &SegmentOptions {
        &self.options
    }

    /// Median span size over the sampled pages, or the default median when
    /// the sample is empty. Even counts average the two middle sizes.
    pub fn median_font_size(&self, doc: &DocumentLayout) -> f32 {
        let mut sizes: Vec<f32> = doc
            .pages
            .iter()
            .take(self.options.median_sample_pages)
            .flat_map(page_sizes)
            .collect();

        if sizes.is_empty() {
            return self.options.default_median;
        }
        sizes.sort_by(f32::total_cmp);

        let mid = sizes.len() / 2;
        if sizes.len() % 2 == 0 {
            (sizes[mid - 1] + sizes[mid]) / 2.0
        } else {
            sizes[mid]
        }
    }

    /// Split a document into sections.
    ///
    /// The leading section is named after the configured initial heading.
    /// A section closed by a heading carries the page it was closed on; the
    /// last one carries the final page of the document. Sections without
    /// body text are dropped.
    pub fn segment(&self, doc: &DocumentLayout) -> DocumentStructure {
        let median = self.median_font_size(doc);
        let mut structure = DocumentStructure::empty(doc.name.clone());

        let mut heading = self.options.initial_heading.clone();
        let mut content: Vec<String> = Vec::new();

        for (index, page) in doc.pages.iter().enumerate().take(self.options.max_pages) {
            for block in self.page_blocks(index, page) {
                if block.text.is_empty() {
                    continue;
                }
                if self.is_heading(&block, median) {
                    if !heading.is_empty() && !content.is_empty() {
                        structure.sections.push(Section::new(
                            std::mem::take(&mut heading),
                            content.join(" "),
                            index as u32,
                            doc.name.clone(),
                        ));
                    }
                    content.clear();
                    heading = block.text;
                } else {
                    content.push(block.text);
                }
            }
        }

        if !heading.is_empty() && !content.is_empty() {
            let last_page = doc.page_count().saturating_sub(1) as u32;
            structure.sections.push(Section::new(
                heading,
                content.join(" "),
                last_page,
                doc.name.clone(),
            ));
        }

        log::debug!(
            "{}: {} sections (median font size {:.1})",
            doc.name,
            structure.sections.len(),
            median
        );
        structure
    }

    /// Larger than the median by the configured ratio, or flagged bold.
    fn is_heading(&self, block: &TextBlock, median: f32) -> bool {
        match block.lead {
            Some((size, flags)) => {
                flags & self.options.bold_flag != 0
                    || size > median * self.options.heading_size_ratio
            }
            None => false,
        }
    }

    /// Blocks of a page. Word-form pages yield one block per visual line.
    fn page_blocks(&self, index: usize, page: &PageLayout) -> Vec<TextBlock> {
        if !page.blocks.is_empty() {
            return page
                .blocks
                .iter()
                .filter(|b| !b.lines.is_empty())
                .map(|b| TextBlock {
                    text: b
                        .lines
                        .iter()
                        .flat_map(|l| l.spans.iter().map(|s| s.text.as_str()))
                        .collect::<Vec<_>>()
                        .join(" ")
                        .trim()
                        .to_string(),
                    lead: lead_style(b.lines[0].spans.first()),
                })
                .collect();
        }

        self.lines
            .from_words(index, &page.words)
            .into_iter()
            .map(|line| TextBlock {
                lead: lead_style(line.spans.first()),
                text: line.text,
            })
            .collect()
    }
}

/// Every span size on a page, in either layout form.
fn page_sizes(page: &PageLayout) -> Vec<f32> {
    if page.blocks.is_empty() {
        page.words.iter().map(|w| w.size).collect()
    } else {
        page.blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .flat_map(|l| l.spans.iter().map(|s| s.size))
            .collect()
    }
}
