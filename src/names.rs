//! Identifier types shared by the package reader, the inference rules and the
//! snapshot.

use crate::name_type;

name_type! {
    /// An item the player may hold.
    pub struct ItemName;
}

name_type! {
    /// A named grouping of items and/or locations.
    pub struct CategoryName;
}

name_type! {
    /// A location that can be checked once its requirement is satisfied.
    pub struct LocationName;
}

name_type! {
    /// A virtual item backed by weighted units of one or more real items.
    pub struct PhantomName;
}

name_type! {
    /// Requirement expression attached to a location.
    ///
    /// The text is opaque here; an external evaluator interprets it against
    /// the player's holdings. The empty expression means "always accessible".
    pub struct Requirement;
}

impl Requirement {
    /// Builds the expression requiring every listed item, as `|A| and |B|`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracker_index::Requirement;
    ///
    /// let req = Requirement::all_of(["Sword", "Shield"]);
    /// assert_eq!(req.as_str(), "|Sword| and |Shield|");
    /// assert!(Requirement::all_of(Vec::<String>::new()).is_empty());
    /// ```
    #[must_use]
    pub fn all_of<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: Vec<String> = items
            .into_iter()
            .map(|item| format!("|{}|", item.as_ref()))
            .collect();
        Self(terms.join(" and "))
    }

    /// Returns `true` when the expression places no requirement.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}
