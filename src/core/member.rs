// Per-member inclusion decisions shared by the read and write paths.
use crate::core::type_key::TypeKey;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Inclusion {
    Include,
    Ignore,
}

/// Per-member adjustment carried by a `TypeContractOverride`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemberOverride {
    pub inclusion: Option<Inclusion>,
    pub rename: Option<String>,
}

/// Whether members are included unless ignored (`OptOut`) or only when marked (`OptIn`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MemberMode {
    #[default]
    OptOut,
    OptIn,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemberContract {
    name: String,
    serialized_name: String,
    value_type: TypeKey,
    included: bool,
}

impl MemberContract {
    pub fn new(name: impl Into<String>, value_type: TypeKey) -> Self {
        let name = name.into();
        Self {
            serialized_name: name.clone(),
            name,
            value_type,
            included: true,
        }
    }

    /// Applies the type-level mode and the member's override, if any.
    pub fn resolved(
        name: impl Into<String>,
        value_type: TypeKey,
        mode: MemberMode,
        member_override: Option<&MemberOverride>,
    ) -> Self {
        let mut contract = Self::new(name, value_type);
        let inclusion = member_override.and_then(|entry| entry.inclusion);
        contract.included = match (mode, inclusion) {
            (_, Some(Inclusion::Ignore)) => false,
            (_, Some(Inclusion::Include)) => true,
            (MemberMode::OptOut, None) => true,
            (MemberMode::OptIn, None) => false,
        };
        if let Some(rename) = member_override.and_then(|entry| entry.rename.as_ref()) {
            contract.serialized_name = rename.clone();
        }
        contract
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn serialized_name(&self) -> &str {
        &self.serialized_name
    }

    pub fn value_type(&self) -> TypeKey {
        self.value_type
    }

    pub fn is_included(&self) -> bool {
        self.included
    }

    /// Exclusion is symmetric: both directions read the same flag.
    pub fn should_include(&self, direction: Direction) -> bool {
        match direction {
            Direction::Read | Direction::Write => self.included,
        }
    }

    pub fn matches_key(&self, key: &str) -> bool {
        self.serialized_name == key
    }

    pub fn matches_key_ignore_case(&self, key: &str) -> bool {
        self.serialized_name.eq_ignore_ascii_case(key)
    }
}

/// Finds the member an input key addresses: exact match first, then case-insensitive.
pub fn find_member<'a, I>(members: I, key: &str) -> Option<&'a MemberContract>
where
    I: IntoIterator<Item = &'a MemberContract>,
    I::IntoIter: Clone,
{
    let members = members.into_iter();
    members
        .clone()
        .find(|member| member.matches_key(key))
        .or_else(|| members.into_iter().find(|member| member.matches_key_ignore_case(key)))
}
