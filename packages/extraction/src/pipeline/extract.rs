//! Field extraction: one page of markup into parallel field columns.
//!
//! Listing markup carries no field labels, so every field comes from a
//! positional convention (which structural block) and a lexical one (which
//! separator). Both live in [`ExtractionRules`]; nothing site-specific is
//! hard-coded here. Treat the output as a best-effort parse.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::types::{
    cities::CityReference,
    config::{ExtractionRules, RunConfig},
    page::RawPage,
    vacancy::FieldArrays,
};

/// City and schedule labels from one meta block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaFields {
    pub city: String,
    pub schedule: String,
}

/// Role, experience and requirements from one skills block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillsFields {
    pub general_name: String,
    pub experience_level: String,
    pub requirements: Vec<String>,
}

struct Selectors {
    card: Option<Selector>,
    organization: Selector,
    title: Selector,
    meta: Selector,
    skills: Selector,
}

/// Turns a [`RawPage`] into [`FieldArrays`].
///
/// Stateless after construction, so one extractor can serve many pages
/// concurrently.
pub struct FieldExtractor {
    rules: ExtractionRules,
    selectors: Selectors,
}

impl FieldExtractor {
    /// Compile the rules. Fails on unparsable selectors or empty separators.
    pub fn new(rules: ExtractionRules) -> ConfigResult<Self> {
        rules.check()?;
        let selectors = Selectors {
            card: rules
                .card
                .as_deref()
                .map(|card| compile("card", card))
                .transpose()?,
            organization: compile("organization", &rules.organization)?,
            title: compile("title", &rules.title)?,
            meta: compile("meta", &rules.meta)?,
            skills: compile("skills", &rules.skills)?,
        };
        Ok(Self { rules, selectors })
    }

    pub fn from_config(config: &RunConfig) -> ConfigResult<Self> {
        Self::new(config.extraction().clone())
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// Extract every field column from one page.
    ///
    /// With a card selector, each card is read in isolation and cards missing
    /// a sub-block are skipped, so the columns line up by construction.
    /// Without one, each column is collected document-wide in document order
    /// and alignment is left to the assembler to verify.
    pub fn extract(&self, page: &RawPage, cities: &CityReference) -> FieldArrays {
        let document = Html::parse_document(&page.html);
        let fields = match &self.selectors.card {
            Some(card) => self.extract_cards(&document, card, cities, &page.url),
            None => self.extract_document(&document, cities, &page.url),
        };

        debug!(
            url = %page.url,
            cards = fields.organizations.len(),
            skipped_cards = fields.skipped_cards,
            lengths = %fields.lengths(),
            "Fields extracted"
        );
        fields
    }

    /// Organization names, in document order.
    pub fn organizations(&self, root: ElementRef<'_>) -> Vec<String> {
        root.select(&self.selectors.organization)
            .map(element_text)
            .collect()
    }

    /// Vacancy titles, in document order.
    pub fn titles(&self, root: ElementRef<'_>) -> Vec<String> {
        root.select(&self.selectors.title).map(element_text).collect()
    }

    /// City/schedule labels of every meta block, in document order.
    pub fn meta_blocks(&self, root: ElementRef<'_>, cities: &CityReference) -> Vec<MetaFields> {
        root.select(&self.selectors.meta)
            .map(|el| self.split_meta(&element_text(el), cities))
            .collect()
    }

    /// Role/experience/requirements of every skills block, in document order.
    pub fn skills_blocks(&self, root: ElementRef<'_>) -> Vec<SkillsFields> {
        root.select(&self.selectors.skills)
            .map(|el| self.split_skills(&element_text(el)))
            .collect()
    }

    /// Partition meta tokens into known cities and everything else.
    pub fn split_meta(&self, text: &str, cities: &CityReference) -> MetaFields {
        let (city_tokens, other_tokens): (Vec<&str>, Vec<&str>) =
            tokens(text, &self.rules.meta_separator).partition(|token| cities.contains(token));

        MetaFields {
            city: self.label(&city_tokens),
            schedule: self.label(&other_tokens),
        }
    }

    /// Split a skills block into role, experience and requirements.
    ///
    /// The first segment is `role[, experience[, ...]]`; any further
    /// segments are requirements. An empty role becomes the no-info
    /// sentinel rather than an empty string.
    pub fn split_skills(&self, text: &str) -> SkillsFields {
        let mut segments = text.split(self.rules.skills_separator.as_str());
        let head = segments.next().unwrap_or_default();

        let mut role = head.split(self.rules.role_separator.as_str()).map(str::trim);
        let general_name = role
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(self.rules.no_info.as_str())
            .to_string();
        let experience_level = role
            .next()
            .filter(|level| !level.is_empty())
            .unwrap_or(self.rules.no_info.as_str())
            .to_string();

        let requirements = segments
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        SkillsFields {
            general_name,
            experience_level,
            requirements,
        }
    }

    fn extract_document(
        &self,
        document: &Html,
        cities: &CityReference,
        url: &str,
    ) -> FieldArrays {
        let root = document.root_element();
        let mut fields = FieldArrays::new(url);
        fields.organizations = self.organizations(root);
        fields.titles = self.titles(root);
        for meta in self.meta_blocks(root, cities) {
            push_meta(&mut fields, meta);
        }
        for skills in self.skills_blocks(root) {
            push_skills(&mut fields, skills);
        }
        fields
    }

    fn extract_cards(
        &self,
        document: &Html,
        card_selector: &Selector,
        cities: &CityReference,
        url: &str,
    ) -> FieldArrays {
        let mut fields = FieldArrays::new(url);

        for (index, card) in document.select(card_selector).enumerate() {
            let organization = card.select(&self.selectors.organization).next();
            let title = card.select(&self.selectors.title).next();
            let meta = card.select(&self.selectors.meta).next();
            let skills = card.select(&self.selectors.skills).next();

            let (Some(organization), Some(title), Some(meta), Some(skills)) =
                (organization, title, meta, skills)
            else {
                warn!(
                    url = %url,
                    card = index,
                    has_organization = organization.is_some(),
                    has_title = title.is_some(),
                    has_meta = meta.is_some(),
                    has_skills = skills.is_some(),
                    "Skipping incomplete listing card"
                );
                fields.skipped_cards += 1;
                continue;
            };

            fields.organizations.push(element_text(organization));
            fields.titles.push(element_text(title));
            push_meta(&mut fields, self.split_meta(&element_text(meta), cities));
            push_skills(&mut fields, self.split_skills(&element_text(skills)));
        }

        fields
    }

    fn label(&self, tokens: &[&str]) -> String {
        if tokens.is_empty() {
            self.rules.no_info.clone()
        } else {
            tokens.join(self.rules.joiner.as_str())
        }
    }
}

fn compile(field: &'static str, selector: &str) -> ConfigResult<Selector> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidExtractionRules {
        field,
        reason: e.to_string(),
    })
}

/// Text content with whitespace runs collapsed to single spaces.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn tokens<'a>(text: &'a str, separator: &'a str) -> impl Iterator<Item = &'a str> {
    text.split(separator)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn push_meta(fields: &mut FieldArrays, meta: MetaFields) {
    fields.cities.push(meta.city);
    fields.schedules.push(meta.schedule);
}

fn push_skills(fields: &mut FieldArrays, skills: SkillsFields) {
    fields.general_names.push(skills.general_name);
    fields.experience_levels.push(skills.experience_level);
    fields.requirements.push(skills.requirements);
}
