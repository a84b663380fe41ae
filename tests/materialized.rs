use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use solid_once::{item_at, Deferred, Materialized, Sequence, Sticky, TryMaterialized};

#[test]
fn test_not_materialized_until_accessed() {
   let traversals = AtomicUsize::new(0);
   let list = Materialized::new(|| {
      traversals.fetch_add(1, Ordering::SeqCst);
      vec![1, 2, 3]
   });

   assert!(!list.is_materialized());
   assert_eq!(format!("{list:?}"), "Materialized(<pending>)");
   assert_eq!(traversals.load(Ordering::SeqCst), 0);

   assert_eq!(list.len(), 3);
   assert!(list.is_materialized());
   assert_eq!(format!("{list:?}"), "Materialized([1, 2, 3])");
}

#[test]
fn test_mapped_source_traversed_once() {
   let traversals = AtomicUsize::new(0);
   let list = Materialized::new(|| {
      traversals.fetch_add(1, Ordering::SeqCst);
      [1, -1, 0, 1].into_iter().map(|i| i + 1)
   });

   assert_eq!(list.len(), 4);
   assert_eq!(list.len(), 4);
   for _ in 0..3 {
      assert_eq!(list.traverse().collect::<Vec<_>>(), [2, 0, 1, 2]);
   }
   assert_eq!(traversals.load(Ordering::SeqCst), 1);
}

#[test]
fn test_every_access_kind_shares_one_traversal() {
   let traversals = AtomicUsize::new(0);
   let list = Materialized::new(|| {
      traversals.fetch_add(1, Ordering::SeqCst);
      "solid".chars()
   });

   assert_eq!(list[0], 's');
   assert_eq!(list.get(4), Some(&'d'));
   assert_eq!(list.get(5), None);
   assert!(list.contains(&'l'));
   assert!(!list.is_empty());
   assert_eq!((&list).into_iter().collect::<String>(), "solid");
   assert_eq!(list.items(), ['s', 'o', 'l', 'i', 'd']);
   assert_eq!(item_at(list.traverse(), 2), Ok('l'));
   assert_eq!(traversals.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stateful_source_is_frozen() {
   let traversals = AtomicUsize::new(0);
   let source = || {
      let n = traversals.fetch_add(1, Ordering::SeqCst);
      vec![n; n + 1]
   };
   // Without materialization every traversal sees different contents.
   assert_eq!(source.traverse().count(), 1);
   assert_eq!(source.traverse().count(), 2);

   let list = Materialized::new(source);
   assert_eq!(list.items(), [2, 2, 2]);
   assert_eq!(list.items(), [2, 2, 2]);
   assert_eq!(traversals.load(Ordering::SeqCst), 3);
}

#[test]
fn test_empty_source() {
   let list = Materialized::new(Vec::<u8>::new);
   assert!(list.is_empty());
   assert_eq!(list.len(), 0);
   assert_eq!(list.iter().next(), None);
}

#[test]
fn test_concurrent_materialization() {
   let traversals = Arc::new(AtomicUsize::new(0));
   let list = {
      let traversals = Arc::clone(&traversals);
      Arc::new(Materialized::new(move || {
         traversals.fetch_add(1, Ordering::SeqCst);
         thread::sleep(Duration::from_millis(20));
         vec![1, 0, -1, -1, 2]
      }))
   };
   let barrier = Arc::new(Barrier::new(10));

   let threads: Vec<_> = (0..10)
      .map(|i| {
         let list = Arc::clone(&list);
         let barrier = Arc::clone(&barrier);
         thread::spawn(move || {
            barrier.wait();
            // Threads race through different first-access paths.
            match i % 3 {
               0 => assert_eq!(list.len(), 5),
               1 => assert_eq!(list.get(4), Some(&2)),
               _ => assert!(list.contains(&0)),
            }
            (list.items().as_ptr() as usize, list.items().to_vec())
         })
      })
      .collect();

   let results: Vec<_> = threads.into_iter().map(|h| h.join().unwrap()).collect();
   assert_eq!(traversals.load(Ordering::SeqCst), 1);
   for (address, items) in &results {
      assert_eq!(*address, results[0].0);
      assert_eq!(items, &[1, 0, -1, -1, 2]);
   }
}

#[test]
fn test_same_instance_on_repeated_retrieval() {
   let created = AtomicUsize::new(0);
   let list = Materialized::new(|| {
      created.fetch_add(1, Ordering::SeqCst);
      [1, -1, 0, 1]
         .into_iter()
         .map(|i| Sticky::new(move || Ok::<_, Infallible>(i)))
   });

   let first = list.get(0).unwrap();
   let again = list.get(0).unwrap();
   assert!(std::ptr::eq(first, again));
   assert!(std::ptr::eq(list.iter().next().unwrap(), &list[0]));
   assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[test]
fn test_nested_values_not_forced() {
   let evaluated = AtomicUsize::new(0);
   let evaluated = &evaluated;
   let list = Materialized::new(|| {
      (0..4).map(move |i| {
         Sticky::new(move || {
            evaluated.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(i * 10)
         })
      })
   });

   assert_eq!(list.len(), 4);
   assert_eq!(evaluated.load(Ordering::SeqCst), 0);

   assert_eq!(list[2].value(), Ok(20));
   assert_eq!(list[2].value(), Ok(20));
   assert!(list[2].is_done());
   assert!(!list[1].is_done());
   assert_eq!(evaluated.load(Ordering::SeqCst), 1);
}

#[test]
fn test_materialized_of_materialized() {
   let inner = Materialized::new(|| 1..=3);
   let outer = Materialized::new(|| inner.traverse().map(|i| i * 2));
   assert_eq!(outer.items(), [2, 4, 6]);
}

#[test]
fn test_try_materialized_success() {
   let traversals = AtomicUsize::new(0);
   let list = TryMaterialized::new(|| {
      traversals.fetch_add(1, Ordering::SeqCst);
      vec![Ok::<_, String>(1), Ok(2), Ok(3)]
   });

   assert!(!list.is_materialized());
   assert_eq!(format!("{list:?}"), "TryMaterialized(<pending>)");
   assert_eq!(list.len(), Ok(3));
   assert_eq!(list.get(1), Ok(Some(&2)));
   assert_eq!(list.get(3), Ok(None));
   assert_eq!(list.is_empty(), Ok(false));
   assert_eq!(list.iter().unwrap().sum::<i32>(), 6);
   assert_eq!(format!("{list:?}"), "TryMaterialized([1, 2, 3])");
   assert_eq!(traversals.load(Ordering::SeqCst), 1);
}

#[test]
fn test_try_materialized_failure_without_partial_results() {
   let traversals = AtomicUsize::new(0);
   let produced = AtomicUsize::new(0);
   let produced = &produced;
   let list = TryMaterialized::new(|| {
      traversals.fetch_add(1, Ordering::SeqCst);
      vec![Ok(1), Err("x"), Ok(3)]
         .into_iter()
         .inspect(move |_| {
            produced.fetch_add(1, Ordering::SeqCst);
         })
   });

   for _ in 0..3 {
      assert_eq!(list.items(), Err(&"x"));
      assert_eq!(list.len(), Err(&"x"));
      assert_eq!(list.get(0), Err(&"x"));
      assert!(list.iter().is_err());
   }
   assert!(list.is_materialized());
   assert_eq!(format!("{list:?}"), "TryMaterialized(Err(\"x\"))");
   // Collection stops at the failure.
   assert_eq!(produced.load(Ordering::SeqCst), 2);
   assert_eq!(traversals.load(Ordering::SeqCst), 1);
}

#[test]
fn test_try_materialized_failure_shared_across_threads() {
   let traversals = Arc::new(AtomicUsize::new(0));
   let list = {
      let traversals = Arc::clone(&traversals);
      Arc::new(TryMaterialized::new(move || {
         let n = traversals.fetch_add(1, Ordering::SeqCst);
         thread::sleep(Duration::from_millis(20));
         (0..4).map(move |i| if i == 2 { Err(format!("traversal {n} failed at {i}")) } else { Ok(i) })
      }))
   };
   let barrier = Arc::new(Barrier::new(8));

   let threads: Vec<_> = (0..8)
      .map(|_| {
         let list = Arc::clone(&list);
         let barrier = Arc::clone(&barrier);
         thread::spawn(move || {
            barrier.wait();
            let failure = list.items().unwrap_err();
            (failure as *const String as usize, failure.clone())
         })
      })
      .collect();

   for handle in threads {
      let (address, failure) = handle.join().unwrap();
      assert_eq!(address, list.items().unwrap_err() as *const String as usize);
      assert_eq!(failure, "traversal 0 failed at 2");
   }
   assert_eq!(traversals.load(Ordering::SeqCst), 1);
}
