use kf_core::{ConvertConfig, Family, Relationship, RelationshipKind};

/// Derive spouse and parent-child edges from families, in family order.
///
/// A family with both spouses yields its spouse edge first. Each child then
/// gets one parent-child edge per present parent, husband before wife. Ids
/// are numbered across all families in emission order.
#[must_use]
pub fn build_relationships(families: &[Family], config: &ConvertConfig) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    let mut next_ordinal = 1;
    let mut emit = |kind: RelationshipKind| {
        relationships.push(Relationship {
            id: config.relationship_id(next_ordinal),
            kind,
        });
        next_ordinal += 1;
    };

    for family in families {
        if let Some((husband, wife)) = family.couple() {
            emit(RelationshipKind::Spouse {
                person1: husband.to_string(),
                person2: wife.to_string(),
                marriage_date: family.marriage_date.clone(),
                marriage_place: family.marriage_place.clone(),
                divorce_date: family.divorce_date.clone(),
            });
        }

        for child in &family.children_ids {
            for parent in family.parents() {
                emit(RelationshipKind::ParentChild {
                    parent: parent.to_string(),
                    child: child.clone(),
                });
            }
        }
    }

    relationships
}
