//! Ordered address collection that normalizes on every write.

use crate::address::{Address, IntoAddress};
use std::fmt;
use std::ops::{AddAssign, Index, RangeBounds};

/// An ordered list of [`Address`] values.
///
/// Every value is normalized before it is stored, and lookups normalize
/// the value before comparing, so strings and addresses can be mixed
/// freely. Duplicates are allowed and order is preserved; it becomes the
/// header order when the message is encoded.
///
/// Positional methods panic on out-of-range indices, like [`Vec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AddressList(Vec<Address>);

impl AddressList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends an address.
    pub fn push(&mut self, value: impl IntoAddress) {
        self.0.push(value.into_address());
    }

    /// Inserts an address at `index`, shifting later ones.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: impl IntoAddress) {
        self.0.insert(index, value.into_address());
    }

    /// Replaces the address at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn set(&mut self, index: usize, value: impl IntoAddress) {
        self.0[index] = value.into_address();
    }

    /// Replaces a range with new addresses and returns the removed ones.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn splice<R, I>(&mut self, range: R, values: I) -> Vec<Address>
    where
        R: RangeBounds<usize>,
        I: IntoIterator,
        I::Item: IntoAddress,
    {
        let values: Vec<Address> = values.into_iter().map(IntoAddress::into_address).collect();
        self.0.splice(range, values).collect()
    }

    /// Replaces the whole contents.
    pub fn replace_all<I>(&mut self, values: I)
    where
        I: IntoIterator,
        I::Item: IntoAddress,
    {
        self.0 = values.into_iter().map(IntoAddress::into_address).collect();
    }

    /// Removes all addresses.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Returns true if the normalized value is in the list.
    pub fn contains(&self, value: impl IntoAddress) -> bool {
        self.0.contains(&value.into_address())
    }

    /// Returns the index of the first match for the normalized value.
    pub fn position(&self, value: impl IntoAddress) -> Option<usize> {
        let wanted = value.into_address();
        self.0.iter().position(|a| *a == wanted)
    }

    /// Counts the matches for the normalized value.
    pub fn count(&self, value: impl IntoAddress) -> usize {
        let wanted = value.into_address();
        self.0.iter().filter(|a| **a == wanted).count()
    }

    /// Removes the first match for the normalized value.
    ///
    /// Returns false if nothing matched.
    pub fn remove(&mut self, value: impl IntoAddress) -> bool {
        match self.position(value) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the address at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> Address {
        self.0.remove(index)
    }

    /// Returns the address at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Address> {
        self.0.get(index)
    }

    /// Returns the first address, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Address> {
        self.0.first()
    }

    /// Returns the addresses as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Address] {
        &self.0
    }

    /// Iterates over the addresses in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Address> {
        self.0.iter()
    }
}

impl Index<usize> for AddressList {
    type Output = Address;

    fn index(&self, index: usize) -> &Address {
        &self.0[index]
    }
}

impl<A: IntoAddress> FromIterator<A> for AddressList {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self(iter.into_iter().map(IntoAddress::into_address).collect())
    }
}

impl<A: IntoAddress> Extend<A> for AddressList {
    fn extend<I: IntoIterator<Item = A>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(IntoAddress::into_address));
    }
}

impl<I> AddAssign<I> for AddressList
where
    I: IntoIterator,
    I::Item: IntoAddress,
{
    fn add_assign(&mut self, rhs: I) {
        self.extend(rhs);
    }
}

impl IntoIterator for AddressList {
    type Item = Address;
    type IntoIter = std::vec::IntoIter<Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AddressList {
    type Item = &'a Address;
    type IntoIter = std::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, address) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{address}")?;
        }
        Ok(())
    }
}
