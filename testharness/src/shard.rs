use crate::error::HarnessError;
use std::str::FromStr;

/// Slice `index` of `total` round-robin slices over a sorted file list, written `index/total`.
///
/// Position `p` lands in slice `p % total`, so every slice is stable as long as the list order is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shard {
  pub index: usize,
  pub total: usize,
}

impl Shard {
  pub fn owns(&self, position: usize) -> bool {
    position % self.total == self.index
  }
}

fn parse_part(part: &str, what: &str, raw: &str) -> Result<usize, HarnessError> {
  part.trim().parse().map_err(|err| {
    HarnessError::InvalidShard(format!("{raw}: {what} `{part}` is not a count ({err})"))
  })
}

impl FromStr for Shard {
  type Err = HarnessError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    let (index, total) = raw
      .split_once('/')
      .ok_or_else(|| HarnessError::InvalidShard(format!("{raw}: want index/total, e.g. 0/4")))?;
    let shard = Shard {
      index: parse_part(index, "index", raw)?,
      total: parse_part(total, "total", raw)?,
    };
    match shard {
      Shard { total: 0, .. } => Err(HarnessError::InvalidShard(format!(
        "{raw}: cannot split into zero shards"
      ))),
      Shard { index, total } if index >= total => Err(HarnessError::InvalidShard(format!(
        "{raw}: index {index} must be less than total {total}"
      ))),
      shard => Ok(shard),
    }
  }
}

/// The items of `items` that `shard` owns, in their original order.
pub fn apply_shard<T>(items: impl IntoIterator<Item = T>, shard: Shard) -> Vec<T> {
  items
    .into_iter()
    .skip(shard.index)
    .step_by(shard.total)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_and_validates() {
    assert_eq!("1/3".parse::<Shard>().unwrap(), Shard { index: 1, total: 3 });
    assert_eq!(" 2 / 5 ".parse::<Shard>().unwrap(), Shard { index: 2, total: 5 });

    for bad in ["3/3", "0/0", "a/2", "2"] {
      let err = bad.parse::<Shard>().unwrap_err();
      assert!(matches!(err, HarnessError::InvalidShard(_)), "{bad}: {err}");
    }
    let err = "3/3".parse::<Shard>().unwrap_err().to_string();
    assert!(err.contains("less than total"), "{err}");
  }

  #[test]
  fn shards_partition_items() {
    let items: Vec<usize> = (0..11).collect();
    let mut seen = vec![0usize; items.len()];
    for index in 0..4 {
      let shard = Shard { index, total: 4 };
      for item in apply_shard(items.clone(), shard) {
        assert!(shard.owns(item));
        seen[item] += 1;
      }
    }
    assert!(seen.iter().all(|count| *count == 1));
  }
}
