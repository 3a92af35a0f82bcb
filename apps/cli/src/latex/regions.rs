//! Region Extractor. Locates the five editable CV regions by literal
//! start/end anchor pairs and returns their interior text.
//!
//! A missing anchor makes that one region absent; it never fails the whole
//! extraction. Extraction is a pure read and idempotent over an unmodified
//! document.

/// A literal start/end anchor pair bounding one editable region.
///
/// The same pair drives extraction and substitution, so the anchors around a
/// substituted region stay byte-identical to the original document.
#[derive(Debug, Clone, Copy)]
pub struct AnchorSpec {
    pub name: &'static str,
    pub start: &'static str,
    pub end: &'static str,
}

pub const TAGLINE: AnchorSpec = AnchorSpec {
    name: "tagline",
    start: "\\tagline{",
    end: "}",
};

pub const HIGHLIGHTBAR: AnchorSpec = AnchorSpec {
    name: "highlightbar",
    start: "\\highlightbar{",
    end: "\n}",
};

// The closing brace of \mainbar{...} belongs to the anchor, not the region,
// so a replacement can never delete it.
pub const MAINBAR: AnchorSpec = AnchorSpec {
    name: "mainbar",
    start: "\\mainbar{",
    end: "}\\makebody",
};

pub const EXPERIENCES: AnchorSpec = AnchorSpec {
    name: "experiences",
    start: "\\section{Experiences description}",
    end: "\\makebody",
};

pub const GENERAL_SKILLS: AnchorSpec = AnchorSpec {
    name: "general_skills",
    start: "\\section{General Skills}",
    end: "\\section{Wheel Chart}",
};

/// The editable regions of a CV. One field per known region; `None` means
/// the anchor pair was not found, which is distinct from an empty region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CvRegions {
    pub tagline: Option<String>,
    pub highlightbar: Option<String>,
    pub mainbar: Option<String>,
    pub experiences: Option<String>,
    pub general_skills: Option<String>,
}

impl CvRegions {
    /// True when no anchor was found at all. Not fatal, but the adaptation
    /// prompt will be degraded (every region rendered as "N/A").
    pub fn is_empty(&self) -> bool {
        self.tagline.is_none()
            && self.highlightbar.is_none()
            && self.mainbar.is_none()
            && self.experiences.is_none()
            && self.general_skills.is_none()
    }
}

/// Extracts all known regions from `document`.
pub fn extract_regions(document: &str) -> CvRegions {
    CvRegions {
        tagline: extract_region(document, &TAGLINE),
        highlightbar: extract_region(document, &HIGHLIGHTBAR),
        mainbar: extract_region(document, &MAINBAR),
        experiences: extract_region(document, &EXPERIENCES),
        general_skills: extract_region(document, &GENERAL_SKILLS),
    }
}

/// Returns the text strictly between the first occurrence of `spec.start`
/// and the first occurrence of `spec.end` after it, or `None` if either
/// anchor is missing.
pub fn extract_region(document: &str, spec: &AnchorSpec) -> Option<String> {
    let (interior_start, interior_end) = locate_interior(document, spec)?;
    Some(document[interior_start..interior_end].to_string())
}

/// Byte range of the region interior, exclusive of both anchors.
pub(crate) fn locate_interior(document: &str, spec: &AnchorSpec) -> Option<(usize, usize)> {
    let start = document.find(spec.start)? + spec.start.len();
    let end = document[start..].find(spec.end)? + start;
    Some((start, end))
}

/// Renders an optional region for prompt embedding.
pub fn prompt_field(region: &Option<String>) -> &str {
    region.as_deref().unwrap_or("N/A")
}
