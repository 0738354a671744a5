//! Resolution of the entities referenced by a line.
//!
//! A line file holds exactly one line or exactly one flexible line. The line
//! references its operator and, through the representation reference, its
//! network; the network references its authority and the operator may
//! reference a branding. All of these live in the common file.

use crate::error::Error;
use netex_model::{
    Authority, Branding, FlexibleLine, Line, Network, NetexEntitiesIndex, Operator, VersionedRef,
};
use serde::{Deserialize, Serialize};

/// A line or a flexible line. A line file contains exactly one of the two;
/// any other cardinality is a fatal error.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum AnyLine {
    Line(Line),
    FlexibleLine(FlexibleLine),
}

impl AnyLine {
    pub fn id(&self) -> &str {
        match self {
            AnyLine::Line(line) => &line.id,
            AnyLine::FlexibleLine(line) => &line.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AnyLine::Line(line) => &line.name,
            AnyLine::FlexibleLine(line) => &line.name,
        }
    }

    pub fn operator_ref(&self) -> &VersionedRef {
        match self {
            AnyLine::Line(line) => &line.operator_ref,
            AnyLine::FlexibleLine(line) => &line.operator_ref,
        }
    }

    pub fn represented_by_group_ref(&self) -> &VersionedRef {
        match self {
            AnyLine::Line(line) => &line.represented_by_group_ref,
            AnyLine::FlexibleLine(line) => &line.represented_by_group_ref,
        }
    }

    fn pin_operator_ref(&mut self, version: &str) {
        let r = match self {
            AnyLine::Line(line) => &mut line.operator_ref,
            AnyLine::FlexibleLine(line) => &mut line.operator_ref,
        };
        *r = r.pinned_to(version);
    }

    fn pin_represented_by_group_ref(&mut self, version: &str) {
        let r = match self {
            AnyLine::Line(line) => &mut line.represented_by_group_ref,
            AnyLine::FlexibleLine(line) => &mut line.represented_by_group_ref,
        };
        *r = r.pinned_to(version);
    }
}

/// The entities referenced by the line of a line file.
///
/// The entities are looked up in the common file and the line carried here is
/// a copy of the source line whose references are pinned to the versions of
/// the resolved entities; the indexes are never mutated.
#[derive(Debug, Clone)]
pub struct LineReferences {
    pub line: AnyLine,
    pub operator: Operator,
    pub network: Network,
    pub authority: Authority,
    /// Branding of the operator; absence is valid
    pub branding: Option<Branding>,
}

impl LineReferences {
    /// Selects the single line of the line file and resolves its references
    /// against the common file.
    ///
    /// Fails when the line file contains zero lines, more than one line, or
    /// both a line and a flexible line, and when the network is reachable
    /// neither directly nor through a group of lines.
    pub fn resolve(
        line_index: &NetexEntitiesIndex,
        common_index: &NetexEntitiesIndex,
    ) -> Result<LineReferences, Error> {
        if line_index.nb_lines() > 1 {
            return Err(Error::MultipleLines);
        }
        if line_index.nb_flexible_lines() > 1 {
            return Err(Error::MultipleFlexibleLines);
        }

        let mut line = match (
            line_index.lines().next(),
            line_index.flexible_lines().next(),
        ) {
            (Some(_), Some(_)) => return Err(Error::BothLineAndFlexibleLine),
            (None, None) => return Err(Error::NoLine),
            (Some(line), None) => AnyLine::Line(line.clone()),
            (None, Some(flexible_line)) => AnyLine::FlexibleLine(flexible_line.clone()),
        };

        let operator = common_index
            .operator(&line.operator_ref().id)
            .ok_or_else(|| Error::ReferenceError(line.operator_ref().id.clone()))?
            .clone();
        line.pin_operator_ref(&operator.version);

        let network = find_network(&line.represented_by_group_ref().id, common_index)?.clone();
        line.pin_represented_by_group_ref(&network.version);

        let authority = common_index
            .authority(&network.transport_organisation_ref.id)
            .ok_or_else(|| Error::ReferenceError(network.transport_organisation_ref.id.clone()))?
            .clone();

        let branding = operator
            .branding_ref
            .as_ref()
            .and_then(|branding_ref| common_index.branding(&branding_ref.id))
            .cloned();

        Ok(LineReferences {
            line,
            operator,
            network,
            authority,
            branding,
        })
    }
}

/// Returns the network referenced by the representation reference.
///
/// The reference can point at a network either directly or indirectly,
/// through a group of lines nested in a network. The fallback is a linear
/// scan over all networks; a dataset only ever holds a handful of them.
fn find_network<'a>(
    network_or_group_of_lines_ref: &str,
    common_index: &'a NetexEntitiesIndex,
) -> Result<&'a Network, Error> {
    if let Some(network) = common_index.network(network_or_group_of_lines_ref) {
        return Ok(network);
    }
    common_index
        .networks()
        .find(|network| {
            network
                .groups_of_lines
                .iter()
                .any(|group| group.id == network_or_group_of_lines_ref)
        })
        .ok_or_else(|| Error::NetworkNotFound(network_or_group_of_lines_ref.to_owned()))
}
