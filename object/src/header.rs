/// Type tag of an entry in the heap's object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectType {
    Sentinel = 0,
    Map,
    Symbol,
    WeakArray,
    DataHandler,
    ValidityCell,
    PropertyCell,
    Function,
    AllocationSite,
    TypeProfile,
}

impl ObjectType {
    pub const COUNT: usize = Self::TypeProfile as usize + 1;

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sentinel => "sentinel",
            Self::Map => "map",
            Self::Symbol => "symbol",
            Self::WeakArray => "weak-array",
            Self::DataHandler => "data-handler",
            Self::ValidityCell => "validity-cell",
            Self::PropertyCell => "property-cell",
            Self::Function => "function",
            Self::AllocationSite => "allocation-site",
            Self::TypeProfile => "type-profile",
        }
    }
}

impl core::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
